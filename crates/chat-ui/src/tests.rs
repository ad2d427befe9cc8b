#[cfg(test)]
mod tests {
    use crate::highlight::*;
    use crate::markdown::*;
    use crate::panels::chat::display_time;
    use crate::state::*;
    use chat_core::event_bus::ChatEvent;
    use chat_core::reducer::Action;
    use chat_types::config::ChatMode;
    use chat_types::event::{Notice, NoticeLevel};
    use chat_types::message::Message;

    // ─── UiState Tests ───────────────────────────────────────

    #[test]
    fn test_ui_state_initial() {
        let state = UiState::new(ChatMode::Regular, 3.0);
        assert!(state.session.transcript.is_empty());
        assert_eq!(state.session.mode, ChatMode::Regular);
        assert!(state.notices.is_empty());
        assert!(!state.is_busy());
        assert!(!state.needs_repaint());
    }

    #[test]
    fn test_ui_state_folds_actions() {
        let mut state = UiState::default();
        let (id, begin) = Action::begin_assistant_stream();
        state.process_events(
            vec![
                ChatEvent::Dispatch(Action::submit_user_message("hi")),
                ChatEvent::Dispatch(begin),
                ChatEvent::Dispatch(Action::ApplyContentDelta { id: id.clone(), content: "Hel".to_string() }),
            ],
            0.0,
        );
        assert!(state.is_busy());
        assert!(state.needs_repaint());
        assert_eq!(state.session.find(&id).unwrap().content, "Hel");

        state.process_events(vec![ChatEvent::Dispatch(Action::CompleteStream { id })], 0.1);
        assert!(!state.is_busy());
    }

    #[test]
    fn test_ui_state_notices_expire() {
        let mut state = UiState::new(ChatMode::Streaming, 4.0);
        state.process_events(vec![ChatEvent::Notify(Notice::error("Error", "first"))], 1.0);
        state.process_events(vec![ChatEvent::Notify(Notice::info("Info", "second"))], 3.0);
        assert_eq!(state.notices.len(), 2);
        assert_eq!(state.notices[0].shown_at, 1.0);

        state.expire(4.5);
        assert_eq!(state.notices.len(), 2);

        state.expire(5.0);
        assert_eq!(state.notices.len(), 1);
        assert_eq!(state.notices[0].notice.level, NoticeLevel::Info);

        state.expire(7.5);
        assert!(state.notices.is_empty());
    }

    #[test]
    fn test_ui_state_dismiss_notice() {
        let mut state = UiState::default();
        state.push_notice(Notice::success("a", "b"), 0.0);
        state.dismiss_notice(5);
        assert_eq!(state.notices.len(), 1);
        state.dismiss_notice(0);
        assert!(state.notices.is_empty());
    }

    #[test]
    fn test_ui_state_copied_label() {
        let mut state = UiState::default();
        state.mark_copied("fn main() {}", 10.0);
        assert!(state.is_copied("fn main() {}"));
        assert!(!state.is_copied("other"));

        state.expire(11.0);
        assert!(state.is_copied("fn main() {}"));
        state.expire(12.0);
        assert!(!state.is_copied("fn main() {}"));
    }

    #[test]
    fn test_ui_state_mode_locked_while_busy() {
        let mut state = UiState::default();
        state.set_mode(ChatMode::Regular);
        assert_eq!(state.session.mode, ChatMode::Regular);

        state.session.apply(Action::SetLoading(true));
        state.set_mode(ChatMode::Streaming);
        assert_eq!(state.session.mode, ChatMode::Regular);
    }

    #[test]
    fn test_ui_state_draft() {
        let mut state = UiState::default();
        state.set_draft("hello".to_string());
        assert!(state.session.can_submit());
        state.process_events(vec![ChatEvent::Dispatch(Action::submit_user_message("hello"))], 0.0);
        assert!(state.session.pending_input.is_empty());
    }

    #[test]
    fn test_ui_state_prunes_markdown_cache() {
        let mut state = UiState::default();
        let reply = Message::assistant("**bold**");
        state.process_events(vec![ChatEvent::Dispatch(Action::SetHistory(vec![reply.clone()]))], 0.0);
        state.markdown.render(&reply.id, &reply.content);
        assert_eq!(state.markdown.len(), 1);

        state.process_events(vec![ChatEvent::Dispatch(Action::Clear)], 0.0);
        assert!(state.markdown.is_empty());
    }

    // ─── format_markdown Tests ───────────────────────────────

    #[test]
    fn test_format_joins_list_number_with_item() {
        assert_eq!(format_markdown("1.\n\nFirst\n2.\nSecond"), "1. First\n2. Second");
    }

    #[test]
    fn test_format_code_fence_on_own_line() {
        assert_eq!(
            format_markdown("Look:```rust   fn main() {}```"),
            "Look:\n```rust\nfn main() {}\n```\n"
        );
    }

    #[test]
    fn test_format_bullets() {
        assert_eq!(format_markdown("•  one\n•two"), "* one\n* two");
    }

    #[test]
    fn test_format_collapses_blank_lines() {
        assert_eq!(format_markdown("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_format_leaves_plain_text() {
        assert_eq!(format_markdown("Just a sentence."), "Just a sentence.");
        assert_eq!(format_markdown(""), "");
    }

    // ─── parse_blocks Tests ──────────────────────────────────

    #[test]
    fn test_parse_paragraph_with_inline_styles() {
        let blocks = parse_blocks("Some **bold**, *italic* and `code`.");
        assert_eq!(blocks.len(), 1);
        let Block::Paragraph(spans) = &blocks[0] else {
            panic!("expected paragraph, got {:?}", blocks[0]);
        };
        assert_eq!(plain_text(spans), "Some bold, italic and code.");
        assert!(spans.iter().any(|s| s.text == "bold" && s.style.strong));
        assert!(spans.iter().any(|s| s.text == "italic" && s.style.emphasis));
        assert!(spans.iter().any(|s| s.text == "code" && s.style.code));
    }

    #[test]
    fn test_parse_heading() {
        let blocks = parse_blocks("## Title");
        assert!(matches!(&blocks[0], Block::Heading { level: 2, spans } if plain_text(spans) == "Title"));
    }

    #[test]
    fn test_parse_code_block() {
        let blocks = parse_blocks("```python\nprint('hi')\n```");
        assert_eq!(
            blocks,
            vec![Block::Code {
                language: Some("python".to_string()),
                code: "print('hi')".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_inline_fence_becomes_code_block() {
        let blocks = parse_blocks("Run this:```sh ls -la```");
        assert!(blocks.iter().any(|b| matches!(
            b,
            Block::Code { language: Some(lang), code } if lang == "sh" && code == "ls -la"
        )));
    }

    #[test]
    fn test_parse_ordered_list() {
        let blocks = parse_blocks("1.\nApples\n2.\nPears");
        let markers: Vec<&str> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::ListItem { marker, .. } => Some(marker.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(markers, vec!["1.", "2."]);
    }

    #[test]
    fn test_parse_nested_list() {
        let blocks = parse_blocks("- outer\n  - inner");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(&blocks[0], Block::ListItem { depth: 0, .. }));
        assert!(matches!(&blocks[1], Block::ListItem { depth: 1, spans, .. } if plain_text(spans) == "inner"));
    }

    #[test]
    fn test_parse_bullet_glyph_list() {
        let blocks = parse_blocks("• one\n• two");
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| matches!(b, Block::ListItem { marker, .. } if marker == "•")));
    }

    #[test]
    fn test_parse_link() {
        let blocks = parse_blocks("See [docs](https://example.com).");
        let Block::Paragraph(spans) = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert!(spans
            .iter()
            .any(|s| s.text == "docs" && s.link.as_deref() == Some("https://example.com")));
    }

    #[test]
    fn test_parse_table() {
        let blocks = parse_blocks("| a | b |\n|---|---|\n| 1 | 2 |");
        assert_eq!(
            blocks,
            vec![Block::Table(vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["1".to_string(), "2".to_string()],
            ])]
        );
    }

    #[test]
    fn test_parse_quote_and_rule() {
        let blocks = parse_blocks("> quoted\n\n---");
        assert!(matches!(&blocks[0], Block::Quote(spans) if plain_text(spans) == "quoted"));
        assert_eq!(blocks[1], Block::Rule);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_blocks("").is_empty());
        assert!(parse_blocks("  \n ").is_empty());
    }

    #[test]
    fn test_block_cache_reparses_on_change() {
        let mut cache = BlockCache::new();
        assert_eq!(cache.render("m1", "Hel").blocks.len(), 1);
        assert_eq!(cache.render("m1", "Hello\n\nWorld").blocks.len(), 2);
        cache.render("m2", "x");
        cache.retain(["m2"]);
        assert_eq!(cache.len(), 1);
    }

    // ─── Highlighting Tests ──────────────────────────────────

    #[test]
    fn test_highlight_rust_uses_several_colors() {
        let code = "fn main() {\n    let answer = 42;\n    println!(\"{}\", answer);\n}";
        let segments = highlight_code(code, "rust").unwrap();
        let colors: std::collections::HashSet<_> = segments.iter().map(|s| s.color).collect();
        assert!(colors.len() > 1, "expected several colors, got {:?}", colors);
        let text: String = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(text, code);
    }

    #[test]
    fn test_highlight_by_extension() {
        assert!(highlight_code("def f():\n    return 1", "py").is_some());
    }

    #[test]
    fn test_highlight_unknown_language() {
        assert!(highlight_code("hello world", "xyzzylang99").is_none());
    }

    #[test]
    fn test_rendered_reply_highlights_fenced_rust() {
        let reply = RenderedReply::new("Intro\n\n```rust\nlet x = 1;\n```\n\n```\nplain\n```");
        assert_eq!(reply.blocks.len(), 3);
        assert_eq!(reply.highlights.len(), 3);
        assert!(reply.highlights[0].is_none());
        let colors: std::collections::HashSet<_> = reply.highlights[1]
            .as_ref()
            .unwrap()
            .iter()
            .map(|s| s.color)
            .collect();
        assert!(colors.len() > 1);
        assert!(reply.highlights[2].is_none());
    }

    // ─── display_time Tests ──────────────────────────────────

    #[test]
    fn test_display_time_formats_rfc3339() {
        let shown = display_time("2024-05-01T12:34:56Z");
        assert_eq!(shown.len(), 8);
        assert_eq!(shown.matches(':').count(), 2);
        assert!(shown.ends_with(":56"));
    }

    #[test]
    fn test_display_time_passes_through_garbage() {
        assert_eq!(display_time("yesterday"), "yesterday");
    }
}
