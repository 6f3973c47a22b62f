//! Static HTML pages.

use std::fmt::{self, Write};

use axum::response::Html;

use crate::error::AppError;

struct HomePage<'a> {
    title: &'a str,
    heading: &'a str,
    login_href: &'a str,
    login_label: &'a str,
}

const HOME: HomePage<'static> = HomePage {
    title: "/home",
    heading: "Blitz Home",
    login_href: "/login/github",
    login_label: "Login with github",
};

impl fmt::Display for HomePage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<!DOCTYPE html>")?;
        writeln!(f, "<html>")?;
        writeln!(f, "<head>")?;
        writeln!(f, "<title>{}</title>", self.title)?;
        writeln!(f, "</head>")?;
        writeln!(f, "<body>")?;
        writeln!(f, "<h1>{}</h1>", self.heading)?;
        writeln!(f)?;
        writeln!(f, "<a href=\"{}\">{}</a>", self.login_href, self.login_label)?;
        writeln!(f, "</body>")?;
        writeln!(f, "</html>")
    }
}

/// Render into a buffer so a failure can still become a 500.
pub fn render_home() -> Result<String, AppError> {
    let mut out = String::new();
    write!(out, "{HOME}").map_err(|e| AppError::Render(e.to_string()))?;
    Ok(out)
}

pub async fn home() -> Result<Html<String>, AppError> {
    render_home().map(Html).map_err(|e| {
        tracing::error!(error = %e, "rendering home page failed");
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_page_has_heading_and_login_link() {
        let html = render_home().expect("render");
        assert!(html.contains("<h1>Blitz Home</h1>"));
        assert!(html.contains("<a href=\"/login/github\">Login with github</a>"));
        assert!(html.trim_end().ends_with("</html>"));
    }
}
