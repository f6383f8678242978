//! HTML pages rendered with Tera.
//!
//! Every template name ends in `.html`, so Tera autoescapes all
//! interpolated values.

use once_cell::sync::Lazy;
use serde::Serialize;
use specimen_core::Observation;
use tera::{Context, Tera};

use super::error::AppError;

const BASE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title }} · Specimen</title>
<style>
body { font-family: system-ui, sans-serif; max-width: 56rem; margin: 2rem auto; padding: 0 1rem; }
nav { display: flex; gap: 1rem; align-items: center; margin-bottom: 1.5rem; }
form.inline { display: inline; margin-left: auto; }
table { border-collapse: collapse; width: 100%; }
td, th { padding: .4rem .6rem; border-bottom: 1px solid #ddd; text-align: left; }
.error { color: #b00020; }
.result { font-size: 1.25rem; }
</style>
</head>
<body>
{% if username %}<nav><a href="/">Observations</a> · <a href="/upload/">Upload</a>
<form method="post" action="/logout/" class="inline"><span>{{ username }}</span> <button type="submit">Log out</button></form></nav>
{% endif %}<h1>{{ title }}</h1>
{% block content %}{% endblock content %}
</body>
</html>
"#;

const LOGIN: &str = r#"{% extends "base.html" %}
{% block content %}{% if error %}<p class="error">{{ error }}</p>
{% endif %}<form method="post" action="/login/">
<p><label>Username <input name="username" autocomplete="username" required></label></p>
<p><label>Password <input name="password" type="password" autocomplete="current-password" required></label></p>
<p><button type="submit">Log in</button></p>
</form>
{% endblock content %}"#;

const UPLOAD: &str = r#"{% extends "base.html" %}
{% block content %}<form method="post" action="/upload/" enctype="multipart/form-data">
<p><input type="file" name="image" accept="image/*"></p>
<p><button type="submit">Identify</button></p>
</form>
{% if missing_file %}<p class="error">Choose a photo to upload.</p>
{% endif %}{% if result %}<section>
<p class="result">Prediction: <strong>{{ result.species }}</strong></p>
<p>Confidence: {{ result.confidence }}%</p>
<p><img src="{{ result.image_url }}" alt="uploaded photo" style="max-width: 24rem"></p>
</section>
{% endif %}{% endblock content %}"#;

const HOME: &str = r#"{% extends "base.html" %}
{% block content %}{% if rows %}<table>
<tr><th>Photo</th><th>Species</th><th>Confidence</th><th>User</th><th>When</th></tr>
{% for row in rows %}<tr><td><a href="{{ row.image_url }}"><img src="{{ row.image_url }}" alt="" width="96"></a></td><td>{{ row.species }}</td><td>{{ row.confidence }}%</td><td>{{ row.username }}</td><td>{{ row.created_at }}</td></tr>
{% endfor %}</table>
{% else %}<p>No observations yet. <a href="/upload/">Upload the first one.</a></p>
{% endif %}{% endblock content %}"#;

const ERROR: &str = r#"{% extends "base.html" %}
{% block content %}<p class="error">{{ message }}</p><p><a href="/">Back</a></p>
{% endblock content %}"#;

/// Parents come before the templates extending them.
const TEMPLATES: [(&str, &str); 5] = [
    ("base.html", BASE),
    ("login.html", LOGIN),
    ("upload.html", UPLOAD),
    ("home.html", HOME),
    ("error.html", ERROR),
];

static PAGES: Lazy<Result<Pages, tera::Error>> = Lazy::new(Pages::new);

/// The compiled page set, built on first use.
pub fn pages() -> Result<&'static Pages, AppError> {
    PAGES
        .as_ref()
        .map_err(|e| AppError::Template(format!("{e:?}")))
}

/// What the upload page shows below the form.
pub enum UploadOutcome<'a> {
    /// Plain form
    Empty,
    /// Form submitted without a file
    MissingFile,
    /// A classified upload
    Result {
        species: &'a str,
        confidence_percent: f32,
        image_url: &'a str,
    },
}

#[derive(Serialize)]
struct ResultView<'a> {
    species: &'a str,
    confidence: String,
    image_url: &'a str,
}

#[derive(Serialize)]
struct ObservationRow<'a> {
    image_url: String,
    species: &'a str,
    confidence: String,
    username: &'a str,
    created_at: String,
}

pub struct Pages {
    tera: Tera,
}

impl Pages {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        for (name, source) in TEMPLATES {
            tera.add_raw_template(name, source)?;
        }
        Ok(Self { tera })
    }

    fn render(&self, name: &str, title: &str, mut context: Context) -> Result<String, tera::Error> {
        context.insert("title", title);
        self.tera.render(name, &context)
    }

    pub fn login(&self, error: Option<&str>) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("error", &error);
        self.render("login.html", "Log in", context)
    }

    pub fn upload(
        &self,
        username: &str,
        outcome: UploadOutcome<'_>,
    ) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("username", username);
        match outcome {
            UploadOutcome::Empty => {}
            UploadOutcome::MissingFile => context.insert("missing_file", &true),
            UploadOutcome::Result {
                species,
                confidence_percent,
                image_url,
            } => context.insert(
                "result",
                &ResultView {
                    species,
                    confidence: format!("{confidence_percent:.1}"),
                    image_url,
                },
            ),
        }
        self.render("upload.html", "Upload an observation", context)
    }

    pub fn home(
        &self,
        username: &str,
        observations: &[Observation],
        media_url: &str,
    ) -> Result<String, tera::Error> {
        let rows: Vec<ObservationRow<'_>> = observations
            .iter()
            .map(|o| ObservationRow {
                image_url: format!("{media_url}{}", o.image),
                species: &o.species_name,
                confidence: format!("{:.1}", o.confidence),
                username: &o.username,
                created_at: o.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            })
            .collect();

        let mut context = Context::new();
        context.insert("username", username);
        context.insert("rows", &rows);
        self.render("home.html", "Observations", context)
    }

    pub fn error(&self, message: &str) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("message", message);
        self.render("error.html", "Something went wrong", context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_compile() {
        assert!(pages().is_ok());
    }

    #[test]
    fn test_interpolated_values_are_escaped() {
        let html = pages()
            .unwrap()
            .error(r#"<b onclick="x">&'</b>"#)
            .unwrap();
        assert!(html.contains("&lt;b onclick=&quot;x&quot;&gt;&amp;&#x27;&lt;&#x2F;b&gt;"));
        assert!(!html.contains("<b onclick"));
    }

    #[test]
    fn test_upload_result_is_escaped_and_formatted() {
        let html = pages()
            .unwrap()
            .upload(
                "ada",
                UploadOutcome::Result {
                    species: "<script>",
                    confidence_percent: 87.25,
                    image_url: "/media/observations/a.jpg",
                },
            )
            .unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("87.2%") || html.contains("87.3%"));
        assert!(html.contains("<span>ada</span>"));
    }

    #[test]
    fn test_login_page_shows_error() {
        let pages = pages().unwrap();
        assert!(pages
            .login(Some("Invalid username or password"))
            .unwrap()
            .contains("Invalid username"));
        let plain = pages.login(None).unwrap();
        assert!(!plain.contains("class=\"error\""));
        assert!(!plain.contains("Log out"));
    }

    #[test]
    fn test_home_without_observations_links_to_upload() {
        let html = pages().unwrap().home("ada", &[], "/media/").unwrap();
        assert!(html.contains("No observations yet"));
        assert!(!html.contains("<table>"));
    }
}
