//! Edge case tests for fos-layout
//!
//! Whole-block inline layout: bidi, whitespace, overflow, alignment,
//! incremental relayout and paged media.

use fos_css::ComputedStyle;
use fos_layout::*;
use fos_text::MonospaceMetrics;
use quickcheck::quickcheck;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn block_style(css: &str) -> ComputedStyle {
    let mut style = ComputedStyle::block();
    style.apply_css(css).unwrap();
    style
}

/// A block holding one text node per entry, `"<br>"` making a line break
fn paragraph(css: &str, parts: &[&str]) -> (RenderTree, NodeId, Vec<NodeId>) {
    let mut tree = RenderTree::new();
    let block = tree.create_block(block_style(css));
    let mut children = Vec::new();
    for part in parts {
        let child = if *part == "<br>" {
            tree.create_line_break(ComputedStyle::default())
        } else {
            tree.create_text(part)
        };
        tree.append_child(block, child).unwrap();
        children.push(child);
    }
    (tree, block, children)
}

fn layout_with(tree: &mut RenderTree, block: NodeId, config: &LayoutConfig) -> LayoutOutcome {
    init_tracing();
    layout_inline_children(tree, block, &MonospaceMetrics::default(), config, false).unwrap()
}

fn layout(tree: &mut RenderTree, block: NodeId) -> LayoutOutcome {
    layout_with(tree, block, &LayoutConfig::default())
}

/// Text leaves of each line in visual order: (text, level)
fn leaves(tree: &RenderTree, block: NodeId) -> Vec<Vec<(String, u8)>> {
    tree.lines(block)
        .iter()
        .map(|&line| {
            tree.leaf_boxes(line)
                .into_iter()
                .filter_map(|id| {
                    let inline_box = tree.inline_box(id)?;
                    let slice = inline_box.text()?;
                    let text: String = tree.text(inline_box.node)[slice.start..slice.end()].iter().collect();
                    Some((text, inline_box.level.0))
                })
                .collect()
        })
        .collect()
}

/// Line placement and the placement of each text leaf on it
type LineGeometry = ((i32, i32, i32), Vec<(String, i32, i32)>);

fn geometry(tree: &RenderTree, block: NodeId) -> Vec<LineGeometry> {
    tree.lines(block)
        .iter()
        .filter_map(|&line| {
            let root = tree.inline_box(line)?;
            let texts = tree
                .leaf_boxes(line)
                .into_iter()
                .filter_map(|id| {
                    let inline_box = tree.inline_box(id)?;
                    let slice = inline_box.text()?;
                    let text: String = tree.text(inline_box.node)[slice.start..slice.end()].iter().collect();
                    Some((text, inline_box.x, inline_box.width))
                })
                .collect();
            Some(((root.x, root.y, root.width), texts))
        })
        .collect()
}

/// Lay out `text` from scratch in a new tree
fn fresh_geometry(css: &str, text: &str) -> (LayoutOutcome, Vec<LineGeometry>) {
    let (mut tree, block, _) = paragraph(css, &[text]);
    let outcome = layout(&mut tree, block);
    (outcome, geometry(&tree, block))
}

fn line_ys(tree: &RenderTree, block: NodeId) -> Vec<i32> {
    tree.lines(block)
        .iter()
        .filter_map(|&line| tree.inline_box(line).map(|b| b.y))
        .collect()
}

// ============================================================================
// BIDI
// ============================================================================

#[test]
fn test_mixed_direction_runs() {
    let (mut tree, block, _) = paragraph("width: 400px", &["Hello مرحبا World"]);
    layout(&mut tree, block);

    let lines = leaves(&tree, block);
    assert_eq!(lines.len(), 1);
    let levels: Vec<u8> = lines[0].iter().map(|(_, level)| *level).collect();
    assert_eq!(levels, vec![0, 1, 0]);
    assert_eq!(lines[0][1].0, "مرحبا");
}

#[test]
fn test_rtl_paragraph_aligns_right() {
    let (mut tree, block, _) = paragraph("width: 100px; direction: rtl", &["abc"]);
    layout(&mut tree, block);

    let line = tree.inline_box(tree.lines(block)[0]).unwrap();
    assert_eq!(line.x, 70);
    assert_eq!(leaves(&tree, block)[0][0].1, 2);
}

#[test]
fn test_visual_order_keeps_logical_order() {
    let (mut tree, block, _) = paragraph("width: 400px; -khtml-visual-order: visual", &["ab אב"]);
    layout(&mut tree, block);

    let text: String = leaves(&tree, block)[0].iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(text, "ab אב");
}

// ============================================================================
// WHITESPACE AND BREAKING
// ============================================================================

#[test]
fn test_collapsed_spaces_take_no_room() {
    let (mut tree, block, _) = paragraph("width: 200px", &["a    b"]);
    layout(&mut tree, block);

    let line = tree.inline_box(tree.lines(block)[0]).unwrap();
    assert!(line.width < 60, "width {}", line.width);
    let text: String = leaves(&tree, block)[0].iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(text.split_whitespace().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn test_overlong_word_overflows() {
    let (mut tree, block, _) = paragraph("width: 100px", &["aaaaaaaaaaaaaaa"]);
    let outcome = layout(&mut tree, block);

    assert_eq!(outcome.line_count, 1);
    assert_eq!(outcome.overflow.right(), 150);
    assert_eq!(outcome.height, 16);
}

#[test]
fn test_break_word_splits_long_word() {
    let (mut tree, block, _) = paragraph("width: 100px; word-wrap: break-word", &["aaaaaaaaaaaaaaa"]);
    let outcome = layout(&mut tree, block);

    assert_eq!(outcome.line_count, 2);
    let lines = leaves(&tree, block);
    assert_eq!(lines[0][0].0.len(), 10);
    assert_eq!(lines[1][0].0.len(), 5);
}

#[test]
fn test_pre_keeps_spaces_and_newlines() {
    let (mut tree, block, _) = paragraph("width: 400px; white-space: pre", &["a  b\nc"]);
    let outcome = layout(&mut tree, block);

    assert_eq!(outcome.line_count, 2);
    let first = tree.inline_box(tree.lines(block)[0]).unwrap();
    assert_eq!(first.width, 40);
}

#[test]
fn test_lone_newline_takes_a_line() {
    let (mut tree, block, _) = paragraph("width: 400px; white-space: pre", &["ab\ncd"]);
    assert_eq!(layout(&mut tree, block).height, 32);

    let (mut tree, block, _) = paragraph("width: 400px; white-space: pre", &["ab\n\ncd"]);
    let outcome = layout(&mut tree, block);
    assert_eq!(outcome.height, 48);
    assert_eq!(outcome.line_count, 2);
    assert_eq!(line_ys(&tree, block), vec![0, 32]);

    let (mut tree, block, _) = paragraph("width: 400px; white-space: pre", &["ab\n\n\ncd"]);
    let outcome = layout(&mut tree, block);
    assert_eq!(outcome.height, 64);
    assert_eq!(line_ys(&tree, block), vec![0, 48]);
}

#[test]
fn test_empty_block() {
    let (mut tree, block, _) = paragraph("width: 100px", &[]);
    let outcome = layout(&mut tree, block);
    assert_eq!(outcome.line_count, 0);
    assert_eq!(outcome.height, 0);
}

#[test]
fn test_whitespace_only_block_has_no_lines() {
    let (mut tree, block, _) = paragraph("width: 100px", &["   ", "  "]);
    let outcome = layout(&mut tree, block);
    assert_eq!(outcome.line_count, 0);
}

#[test]
fn test_consecutive_breaks_make_empty_lines() {
    let (mut tree, block, _) = paragraph("width: 100px", &["a", "<br>", "<br>", "b"]);
    let outcome = layout(&mut tree, block);
    assert_eq!(outcome.line_count, 3);
    assert_eq!(line_ys(&tree, block), vec![0, 16, 32]);
}

// ============================================================================
// ALIGNMENT
// ============================================================================

#[test]
fn test_justify_fills_all_but_last_line() {
    let (mut tree, block, _) = paragraph("width: 100px; text-align: justify", &["aa bb cc dd"]);
    let outcome = layout(&mut tree, block);

    assert_eq!(outcome.line_count, 2);
    let lines = tree.lines(block);
    assert_eq!(tree.inline_box(lines[0]).unwrap().width, 100);
    assert_eq!(tree.inline_box(lines[1]).unwrap().width, 20);
}

#[test]
fn test_justify_spreads_over_runs() {
    let (mut tree, block, nodes) =
        paragraph("width: 150px; text-align: justify", &["aa bb ", "cc dd ", "ee ff gg hh"]);
    let outcome = layout(&mut tree, block);
    assert_eq!(outcome.line_count, 2);

    let first = tree.lines(block)[0];
    assert_eq!(tree.inline_box(first).unwrap().width, 150);
    let added: Vec<(NodeId, i32)> = tree
        .leaf_boxes(first)
        .into_iter()
        .filter_map(|id| {
            let inline_box = tree.inline_box(id)?;
            Some((inline_box.node, inline_box.text()?.space_add))
        })
        .collect();
    assert_eq!(added, vec![(nodes[0], 5), (nodes[1], 5), (nodes[2], 0)]);
    assert_eq!(added.iter().map(|(_, add)| add).sum::<i32>(), 150 - 140);
}

#[test]
fn test_justify_without_width_limit() {
    let (mut tree, block, _) = paragraph("text-align: justify; white-space: pre-line", &["a b c d e f\ng"]);
    let outcome = layout(&mut tree, block);

    assert_eq!(outcome.line_count, 2);
    let lines = leaves(&tree, block);
    assert_eq!(lines[0][0].0, "a b c d e f");
    assert_eq!(lines[1][0].0, "g");
    let first = tree.inline_box(tree.lines(block)[0]).unwrap();
    assert!(first.width >= 110, "width {}", first.width);
}

#[test]
fn test_text_overflow_ellipsis() {
    let (mut tree, block, _) = paragraph(
        "width: 100px; white-space: nowrap; overflow: hidden; text-overflow: ellipsis",
        &["abcdefghijklmnop"],
    );
    layout(&mut tree, block);

    let line = tree.inline_box(tree.lines(block)[0]).unwrap();
    let ellipsis = line.root().and_then(|root| root.ellipsis).unwrap();
    assert!(ellipsis.x + ellipsis.width <= 100);
}

// ============================================================================
// INCREMENTAL RELAYOUT
// ============================================================================

#[test]
fn test_edit_rebuilds_only_dirty_line() {
    let (mut tree, block, nodes) =
        paragraph("width: 100px", &["one", "<br>", "two", "<br>", "three", "<br>", "four"]);
    let first = layout(&mut tree, block);
    assert_eq!(first.line_count, 4);

    tree.set_text(nodes[2], "TWO").unwrap();
    let second = layout(&mut tree, block);
    assert!(!second.full_layout);
    assert_eq!(second.stats.lines_built, 1);
    assert_eq!(second.stats.lines_reused, 2);
    assert_eq!(second.line_count, 4);
    assert_eq!(second.height, first.height);
    assert_eq!(leaves(&tree, block)[1][0].0, "TWO");
}

#[test]
fn test_edit_that_adds_a_line_shifts_the_rest() {
    let (mut tree, block, nodes) =
        paragraph("width: 100px", &["one", "<br>", "two", "<br>", "three", "<br>", "four"]);
    layout(&mut tree, block);

    tree.set_text(nodes[2], "aaaa bbbb cccc").unwrap();
    let outcome = layout(&mut tree, block);
    assert_eq!(outcome.line_count, 5);
    assert_eq!(outcome.height, 80);
    assert_eq!(line_ys(&tree, block), vec![0, 16, 32, 48, 64]);
    assert_eq!(outcome.stats.lines_reused, 2);
}

#[test]
fn test_edit_inside_paragraph_reuses_later_lines() {
    let (mut tree, block, nodes) = paragraph("width: 40px", &["aaaa bbbb cccc dddd eeee"]);
    assert_eq!(layout(&mut tree, block).line_count, 5);

    tree.set_text(nodes[0], "aaaa bbbb cxcc dddd eeee").unwrap();
    let outcome = layout(&mut tree, block);
    assert!(!outcome.full_layout);
    // The edited line and the one before it
    assert_eq!(outcome.stats.lines_built, 2);
    assert_eq!(outcome.stats.lines_reused, 2);

    let (fresh, expected) = fresh_geometry("width: 40px", "aaaa bbbb cxcc dddd eeee");
    assert_eq!(geometry(&tree, block), expected);
    assert_eq!(outcome.height, fresh.height);
}

#[test]
fn test_insert_moves_following_slices() {
    let (mut tree, block, nodes) = paragraph("width: 40px", &["aaaa bbbb cccc dddd eeee"]);
    layout(&mut tree, block);

    tree.insert_text(nodes[0], 11, "xx").unwrap();
    let outcome = layout(&mut tree, block);
    assert_eq!(outcome.stats.lines_built, 2);
    assert_eq!(outcome.stats.lines_reused, 2);
    let lines = leaves(&tree, block);
    assert_eq!(lines[2][0].0, "cxxccc");
    assert_eq!(lines[3][0].0, "dddd");
    assert_eq!(lines[4][0].0, "eeee");

    let (fresh, expected) = fresh_geometry("width: 40px", "aaaa bbbb cxxccc dddd eeee");
    assert_eq!(geometry(&tree, block), expected);
    assert_eq!(outcome.height, fresh.height);
}

#[test]
fn test_delete_pulls_words_back() {
    let (mut tree, block, nodes) = paragraph("width: 90px", &["aaaa bbbb cccc dddd eeee"]);
    assert_eq!(layout(&mut tree, block).line_count, 3);

    tree.delete_text(nodes[0], 0..5).unwrap();
    let outcome = layout(&mut tree, block);
    assert!(!outcome.full_layout);
    assert_eq!(outcome.line_count, 2);

    let (fresh, expected) = fresh_geometry("width: 90px", "bbbb cccc dddd eeee");
    assert_eq!(geometry(&tree, block), expected);
    assert_eq!(outcome.height, fresh.height);
}

#[test]
fn test_relayout_children_forces_full_layout() {
    let (mut tree, block, _) = paragraph("width: 100px", &["one", "<br>", "two"]);
    layout(&mut tree, block);
    let outcome = layout_inline_children(
        &mut tree,
        block,
        &MonospaceMetrics::default(),
        &LayoutConfig::default(),
        true,
    )
    .unwrap();
    assert!(outcome.full_layout);
    assert_eq!(outcome.stats.lines_built, 2);
}

// ============================================================================
// PAGED MEDIA
// ============================================================================

#[test]
fn test_line_crossing_page_moves_down() {
    let (mut tree, block, _) = paragraph("width: 40px", &["aaaa bbbb cccc dddd"]);
    let config = LayoutConfig::default().with_pagination(Pagination::new(40));
    let outcome = layout_with(&mut tree, block, &config);

    assert_eq!(outcome.line_count, 4);
    assert!(outcome.contains_page_break);
    assert!(!outcome.needs_page_clear);
    assert_eq!(line_ys(&tree, block), vec![0, 16, 40, 56]);
    assert_eq!(outcome.height, 72);
}

#[test]
fn test_config_from_json() {
    let config: LayoutConfig = serde_json::from_str(r#"{"resync_lookahead": 2}"#).unwrap();
    assert_eq!(config.resync_lookahead, 2);
    assert_eq!(config.max_embedding_level, 61);
    assert!(config.pagination.is_none());
}

#[test]
fn test_outcome_serializes() {
    let (mut tree, block, _) = paragraph("width: 100px", &["abc"]);
    let outcome = layout(&mut tree, block);
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["line_count"], 1);
    assert_eq!(json["stats"]["lines_built"], 1);
}

// ============================================================================
// PROPERTIES
// ============================================================================

fn text_from(bytes: &[u8], alphabet: &[char]) -> String {
    bytes.iter().map(|b| alphabet[*b as usize % alphabet.len()]).collect()
}

quickcheck! {
    fn prop_every_letter_laid_out_once(bytes: Vec<u8>, width: u8) -> bool {
        let text = text_from(&bytes, &['a', 'b', ' ', ' ', 'c']);
        let css = format!("width: {}px", width as i32 + 10);
        let (mut tree, block, _) = paragraph(&css, &[text.as_str()]);
        layout(&mut tree, block);

        let laid_out: String = leaves(&tree, block)
            .into_iter()
            .flatten()
            .map(|(t, _)| t)
            .collect();
        let letters = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        letters(&laid_out) == letters(&text)
    }

    fn prop_lines_cover_text_in_order(bytes: Vec<u8>, width: u8) -> bool {
        let text = text_from(&bytes, &['a', 'b', ' ', ' ', 'c']);
        let css = format!("width: {}px", width as i32 + 10);
        let (mut tree, block, _) = paragraph(&css, &[text.as_str()]);
        layout(&mut tree, block);

        let chars: Vec<char> = text.chars().collect();
        let mut covered = Vec::new();
        for &line in tree.lines(block) {
            for id in tree.leaf_boxes(line) {
                if let Some(slice) = tree.inline_box(id).and_then(|b| b.text()) {
                    covered.extend(slice.start..slice.end());
                }
            }
        }
        let in_order = covered.windows(2).all(|w| w[0] < w[1]);
        let skipped_only_spaces = (0..chars.len())
            .filter(|i| !covered.contains(i))
            .all(|i| chars[i] == ' ');
        in_order && skipped_only_spaces
    }

    fn prop_incremental_matches_full_layout(bytes: Vec<u8>, width: u8, at: u8, edit: u8) -> bool {
        let text = text_from(&bytes, &['a', 'b', ' ', 'a']);
        let css = format!("width: {}px", width as i32 % 100 + 20);
        let (mut tree, block, nodes) = paragraph(&css, &[text.as_str()]);
        layout(&mut tree, block);

        let len = text.chars().count();
        let offset = at as usize % (len + 1);
        match edit % 3 {
            0 => tree.insert_text(nodes[0], offset, "x").unwrap(),
            1 => tree.insert_text(nodes[0], offset, " ").unwrap(),
            _ => tree.delete_text(nodes[0], offset..(offset + 1).min(len)).unwrap(),
        }
        let outcome = layout(&mut tree, block);

        let edited: String = tree.text(nodes[0]).iter().collect();
        let (fresh, expected) = fresh_geometry(&css, &edited);
        geometry(&tree, block) == expected && outcome.height == fresh.height
    }

    fn prop_lines_stack_downwards(bytes: Vec<u8>, width: u8) -> bool {
        let text = text_from(&bytes, &['a', 'a', ' ', 'b']);
        let css = format!("width: {}px", width as i32 + 10);
        let (mut tree, block, _) = paragraph(&css, &[text.as_str()]);
        let outcome = layout(&mut tree, block);

        let ys = line_ys(&tree, block);
        ys.windows(2).all(|w| w[0] < w[1]) && outcome.height == 16 * ys.len() as i32
    }

    fn prop_level_parity_follows_script(bytes: Vec<u8>) -> bool {
        let text = text_from(&bytes, &['a', 'b', ' ', 'א', 'ב']);
        let (mut tree, block, _) = paragraph("width: 10000px", &[text.as_str()]);
        layout(&mut tree, block);

        leaves(&tree, block).into_iter().flatten().all(|(t, level)| {
            let hebrew = t.chars().any(|c| ('\u{5d0}'..='\u{5ea}').contains(&c));
            let latin = t.chars().any(|c| c.is_ascii_alphabetic());
            !(hebrew && latin) && (!hebrew || level % 2 == 1) && (!latin || level % 2 == 0)
        })
    }
}
