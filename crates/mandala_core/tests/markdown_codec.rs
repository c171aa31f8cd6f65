use mandala_core::codec::markdown::{to_markdown, MAIN_THEME_PLACEHOLDER};
use mandala_core::codec::{parse, parse_with_stats, serialize, tree::to_tree};
use mandala_core::{import_template, ExportFlavor, Grid};

fn health_chart() -> Grid {
    let mut grid = Grid::new();
    grid.set_main_theme("Health");
    grid.set_sub_theme(0, "Diet").unwrap();
    grid.set_block_cell(0, 0, "Eat vegetables").unwrap();
    grid.set_block_cell(0, 1, "No late snacks").unwrap();
    grid
}

#[test]
fn health_diet_chart_round_trips() {
    let grid = health_chart();
    let text = to_markdown(&grid);

    assert!(text.starts_with("# Health\n\n## Diet\n- [ ] Eat vegetables\n- [ ] No late snacks\n"));
    assert!(text.contains("## サブテーマ2\n"));

    let parsed = parse(&text);
    assert_eq!(parsed, grid);
    assert_eq!(parsed.cell(30).unwrap(), "Diet");
    assert_eq!(parsed.cell(10).unwrap(), "Diet");
    assert_eq!(parsed.filled_count(), 5);
}

#[test]
fn ninth_heading_and_orphan_bullets_are_dropped() {
    let mut text = String::from("- [ ] orphan\n# Goal\n");
    for i in 1..=9 {
        text.push_str(&format!("## Sub {i}\n"));
    }
    text.push_str("- [ ] belongs to nobody\n");

    let (grid, stats) = parse_with_stats(&text);
    assert_eq!(grid.main_theme(), "Goal");
    assert_eq!(stats.sub_themes, 8);
    assert_eq!(stats.dropped_headings, 1);
    assert_eq!(grid.sub_theme(8).unwrap(), "Sub 8");
    // The ninth heading is dropped but block 8 stays active.
    assert_eq!(grid.block_cell(8, 0).unwrap(), "belongs to nobody");
    assert_eq!(stats.dropped_bullets, 1);
}

#[test]
fn ninth_bullet_in_a_block_is_dropped() {
    let mut text = String::from("# Goal\n## Only\n");
    for i in 1..=9 {
        text.push_str(&format!("* [x] step {i}\n"));
    }
    let (grid, stats) = parse_with_stats(&text);
    assert_eq!(stats.actions, 8);
    assert_eq!(stats.dropped_bullets, 1);
    assert_eq!(grid.block_cell(0, 3).unwrap(), "step 4");
    assert_eq!(grid.block_cell(0, 5).unwrap(), "step 5");
    assert!(grid.block_cell(0, 4).unwrap() == "Only");
}

#[test]
fn placeholders_read_back_as_empty() {
    let text = to_markdown(&Grid::new());
    assert!(text.starts_with(&format!("# {MAIN_THEME_PLACEHOLDER}")));
    assert!(parse(&text).is_empty());
}

#[test]
fn sparse_chart_placeholders_are_numbered_by_block() {
    let mut text = String::from("# Health\n\n## Diet\n- [ ] Eat vegetables\n\n");
    for number in [2, 3, 4, 6, 7, 8, 9] {
        text.push_str(&format!("## サブテーマ{number}\n\n"));
    }
    assert_eq!(to_markdown(&parse(&text)), text);

    let grid = parse(&text);
    for block in [1, 2, 3, 5, 6, 7, 8] {
        assert_eq!(grid.sub_theme(block).unwrap(), "");
    }
    assert_eq!(grid.filled_count(), 4);
}

#[test]
fn template_parses_into_actions_only() {
    let grid = parse(&import_template());
    assert_eq!(grid.main_theme(), "メインテーマ");
    assert!(grid.sub_theme(0).unwrap().is_empty());
    assert_eq!(grid.block_cell(0, 0).unwrap(), "行動1-1");
    assert_eq!(grid.block_cell(8, 8).unwrap(), "行動8-8");
}

#[test]
fn tree_export_uses_branches_and_placeholders() {
    let tree = to_tree(&health_chart());
    assert!(tree.starts_with("■ Health\n\n├─ 1. Diet\n│  ├─ 1-1. Eat vegetables\n"));
    assert!(tree.contains("└─ 8. (未設定)\n"));
    assert_eq!(serialize(&health_chart(), ExportFlavor::Tree), tree);
}
