//! LaTeX rendering for `$$...$$` placeholders.

use latex2mathml::{DisplayStyle, latex_to_mathml};

/// Turns LaTeX into markup. Implementations never fail: LaTeX that can not be
/// rendered produces degraded markup instead.
pub trait MathRenderer: Send + Sync {
    fn render(&self, latex: &str) -> String;
}

/// Inline MathML via `latex2mathml`.
///
/// Invalid input renders as the escaped LaTeX source in a
/// `livecalc-latex-error` span, with the parser's complaint as its title.
#[derive(Clone, Copy, Debug, Default)]
pub struct MathmlRenderer;

impl MathRenderer for MathmlRenderer {
    fn render(&self, latex: &str) -> String {
        match latex_to_mathml(latex, DisplayStyle::Inline) {
            Ok(mathml) => mathml,
            Err(e) => {
                log::debug!("latex fallback for {:?}: {}", latex, e);
                format!(
                    "<span class=\"livecalc-latex-error\" title=\"{}\">{}</span>",
                    html_escape::encode_double_quoted_attribute(&e.to_string()),
                    html_escape::encode_text(latex)
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_mathml() {
        let out = MathmlRenderer.render("x^2");
        assert!(out.contains("<math"));
        assert!(out.contains("<msup>"));
    }

    #[test]
    fn test_invalid_latex_still_renders_something() {
        let out = MathmlRenderer.render(r"\frac{1}{");
        assert!(!out.is_empty());
    }
}
