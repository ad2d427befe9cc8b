//! Syntax colouring for fenced code blocks, via syntect's bundled grammars.

use std::sync::OnceLock;

use egui::Color32;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const THEME: &str = "base16-ocean.dark";

/// A run of code drawn in one colour
#[derive(Debug, Clone, PartialEq)]
pub struct CodeSegment {
    pub text: String,
    pub color: Color32,
    pub italic: bool,
}

struct Assets {
    syntaxes: SyntaxSet,
    theme: Theme,
}

fn assets() -> &'static Assets {
    static ASSETS: OnceLock<Assets> = OnceLock::new();
    ASSETS.get_or_init(|| {
        let syntaxes = SyntaxSet::load_defaults_newlines();
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = match themes.remove(THEME) {
            Some(theme) => theme,
            None => themes
                .into_values()
                .next()
                .expect("syntect ships with at least one theme"),
        };
        Assets { syntaxes, theme }
    })
}

/// Colour `code` as `language` (a fence tag such as `rust` or `py`).
/// Returns `None` for languages without a bundled grammar.
pub fn highlight_code(code: &str, language: &str) -> Option<Vec<CodeSegment>> {
    let assets = assets();
    let syntax = assets
        .syntaxes
        .find_syntax_by_token(language)
        .or_else(|| assets.syntaxes.find_syntax_by_extension(language))?;

    let mut highlighter = HighlightLines::new(syntax, &assets.theme);
    let mut segments: Vec<CodeSegment> = Vec::new();
    for line in LinesWithEndings::from(code) {
        let ranges = match highlighter.highlight_line(line, &assets.syntaxes) {
            Ok(ranges) => ranges,
            Err(e) => {
                log::warn!("Highlighting {} code failed: {}", language, e);
                return None;
            }
        };
        for (style, text) in ranges {
            let color = Color32::from_rgb(style.foreground.r, style.foreground.g, style.foreground.b);
            let italic = style.font_style.contains(FontStyle::ITALIC);
            match segments.last_mut() {
                Some(last) if last.color == color && last.italic == italic => last.text.push_str(text),
                _ => segments.push(CodeSegment { text: text.to_string(), color, italic }),
            }
        }
    }
    Some(segments)
}
