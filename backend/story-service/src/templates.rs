//! Tera view renderer.
//!
//! Views are embedded with `include_str!` so the binary and the tests do not
//! depend on the working directory.

use crate::error::Result;
use crate::helpers;
use actix_web::HttpResponse;
use serde::Serialize;
use tera::{Context, Tera};

const VIEWS: &[(&str, &str)] = &[
    ("layouts/base.html", include_str!("../templates/layouts/base.html")),
    ("stories/index.html", include_str!("../templates/stories/index.html")),
    ("stories/show.html", include_str!("../templates/stories/show.html")),
    ("stories/add.html", include_str!("../templates/stories/add.html")),
    ("stories/edit.html", include_str!("../templates/stories/edit.html")),
    ("dashboard.html", include_str!("../templates/dashboard.html")),
];

pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        helpers::register_filters(&mut tera);
        tera.add_raw_templates(VIEWS.iter().copied())?;
        Ok(Self { tera })
    }

    /// Render `view` with `context` into a string.
    pub fn render_to_string<T: Serialize>(&self, view: &str, context: &T) -> Result<String> {
        let ctx = Context::from_serialize(context)?;
        Ok(self.tera.render(view, &ctx)?)
    }

    /// Render `view` into a `200 OK` HTML response.
    pub fn render<T: Serialize>(&self, view: &str, context: &T) -> Result<HttpResponse> {
        let body = self.render_to_string(view, context)?;
        Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn all_views_compile() {
        assert!(Templates::new().is_ok());
    }

    #[test]
    fn index_escapes_user_content() {
        let templates = Templates::new().unwrap();
        let html = templates
            .render_to_string(
                "stories/index.html",
                &json!({
                    "stories": [{
                        "id": "00000000-0000-0000-0000-000000000001",
                        "user_id": "00000000-0000-0000-0000-000000000002",
                        "title": "<script>alert(1)</script>",
                        "body": "<p>hello there</p>",
                        "status": "public",
                        "allow_comments": true,
                        "created_at": "2024-01-01T00:00:00Z",
                        "user": {
                            "id": "00000000-0000-0000-0000-000000000002",
                            "display_name": "Ada",
                            "image": null
                        }
                    }],
                    "viewer": null
                }),
            )
            .unwrap();

        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("hello there"));
    }
}
