use crate::core::Submission;
use crate::utils::error::Result;
use minijinja::{context, escape_formatter, AutoEscape, Environment, Error, Output, State, Value};
use std::fmt::Write;

pub const SUBMITTED_TEMPLATE: &str = "submitted_form.html";

/// Page templates, compiled once at startup.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_formatter(markup_formatter);
        env.add_template(
            SUBMITTED_TEMPLATE,
            include_str!("../../templates/submitted_form.html"),
        )?;
        Ok(Self { env })
    }

    pub fn render_submitted(&self, submission: &Submission) -> Result<String> {
        let template = self.env.get_template(SUBMITTED_TEMPLATE)?;
        let page = template.render(context! {
            name => submission.name,
            email => submission.email,
            site => submission.site_url,
            comments => submission.comments,
        })?;
        Ok(page)
    }
}

/// HTML 自動跳脫，規則同 Jinja2 (markupsafe)：`/` 不跳脫，網址可原樣顯示
fn markup_formatter(out: &mut Output<'_>, state: &State<'_, '_>, value: &Value) -> std::result::Result<(), Error> {
    let Some(text) = value.as_str() else {
        return escape_formatter(out, state, value);
    };
    if value.is_safe() || !matches!(state.auto_escape(), AutoEscape::Html) {
        return escape_formatter(out, state, value);
    }

    for c in text.chars() {
        let result = match c {
            '&' => out.write_str("&amp;"),
            '<' => out.write_str("&lt;"),
            '>' => out.write_str("&gt;"),
            '"' => out.write_str("&#34;"),
            '\'' => out.write_str("&#39;"),
            _ => out.write_char(c),
        };
        result.map_err(Error::from)?;
    }
    Ok(())
}
