use super::*;

mod caching;
mod resolution;

pub const DEEP_LEARNING: &str = r#"{
  "status": "ok",
  "message": {
    "DOI": "10.1038/nature14539",
    "title": ["Deep learning"],
    "author": [
      {"given": "Yann", "family": "LeCun"},
      {"given": "Yoshua", "family": "Bengio"},
      {"given": "Geoffrey", "family": "Hinton"}
    ],
    "published-print": {"date-parts": [[2015, 5, 28]]},
    "published": {"date-parts": [[2015, 5, 27]]}
  }
}"#;

pub const SEARCH_RESULTS: &str = r#"{
  "status": "ok",
  "message": {
    "items": [
      {
        "DOI": "10.1109/5.726791",
        "title": ["Gradient-based learning applied to document recognition"],
        "author": [{"given": "Y.", "family": "Lecun"}, {"given": "L.", "family": "Bottou"}],
        "container-title": ["Proceedings of the IEEE"],
        "published": {"date-parts": [[1998]]}
      },
      {
        "DOI": "10.1038/nature14539",
        "title": ["Deep learning"],
        "author": [{"given": "Yann", "family": "LeCun"}, {"given": "Yoshua", "family": "Bengio"}],
        "container-title": ["Nature"],
        "published": {"date-parts": [[2015]]}
      }
    ]
  }
}"#;
