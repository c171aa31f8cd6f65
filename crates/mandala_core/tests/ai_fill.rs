use mandala_core::model::layout::{global_index, SATELLITE_BLOCKS};
use mandala_core::{ai::apply_fill, AiError, FillMode, FillTarget, Grid};
use serde_json::json;

fn health() -> Grid {
    let mut grid = Grid::new();
    grid.set_main_theme("Health");
    grid
}

fn full_response() -> String {
    let blocks: Vec<_> = (1..=8)
        .map(|i| {
            json!({
                "theme": format!("T{i}"),
                "actions": (1..=8).map(|j| format!("a{i}-{j}")).collect::<Vec<_>>(),
            })
        })
        .collect();
    format!("Here you go:\n```json\n{}\n```", serde_json::to_string(&blocks).unwrap())
}

#[test]
fn full_fill_only_writes_empty_cells_and_keeps_pairs_mirrored() {
    let mut grid = health();
    grid.set_sub_theme(0, "Diet").unwrap();
    grid.set_block_cell(0, 0, "Walk").unwrap();

    let outcome = apply_fill(&mut grid, FillMode::Full, &FillTarget::new(40), &full_response()).unwrap();

    assert_eq!(outcome.filled, 7 + 63);
    assert_eq!(grid.sub_theme(0).unwrap(), "Diet");
    assert_eq!(grid.block_cell(0, 0).unwrap(), "Walk");
    assert_eq!(grid.block_cell(0, 1).unwrap(), "a1-1");
    assert_eq!(grid.cell(global_index(4, 1)).unwrap(), "T2");
    assert!(grid.mirror_violations().is_empty());
    for &block in &SATELLITE_BLOCKS {
        assert!(grid.actions(block).unwrap().all(|(_, action)| !action.is_empty()));
    }
}

#[test]
fn block_fill_on_the_meta_block_writes_sub_theme_pairs() {
    let mut grid = health();
    grid.set_sub_theme(0, "Diet").unwrap();

    let response = r#"["Sleep", "Work", "Money", "Family", "Hobby", "Study", "Mind", "Body"]"#;
    let outcome = apply_fill(&mut grid, FillMode::Block, &FillTarget::new(40), response).unwrap();

    assert_eq!(outcome.filled, 7);
    assert_eq!(grid.sub_theme(0).unwrap(), "Diet");
    assert_eq!(grid.sub_theme(1).unwrap(), "Sleep");
    assert_eq!(grid.block_cell(1, 4).unwrap(), "Sleep");
    assert_eq!(grid.sub_theme(8).unwrap(), "Mind");
    assert!(grid.mirror_violations().is_empty());
}

#[test]
fn sub_themes_mode_targets_the_meta_block_from_anywhere() {
    let mut grid = health();
    let response = r#"["A","B","C","D","E","F","G","H"]"#;
    apply_fill(&mut grid, FillMode::SubThemes, &FillTarget::new(0), response).unwrap();
    assert_eq!(grid.sub_theme(5).unwrap(), "E");
    assert!(grid.block_cell(0, 0).unwrap().is_empty());
}

#[test]
fn short_block_response_cycles() {
    let mut grid = health();
    apply_fill(&mut grid, FillMode::Block, &FillTarget::new(0), r#"["x", "y"]"#).unwrap();
    let actions: Vec<&str> = grid.actions(0).unwrap().map(|(_, action)| action).collect();
    assert_eq!(actions, vec!["x", "y", "x", "y", "x", "y", "x", "y"]);
}

#[test]
fn single_fill_replaces_seed_but_not_other_text() {
    let mut grid = health();
    let target = FillTarget::with_seed(5, "run");
    let outcome =
        apply_fill(&mut grid, FillMode::Single, &target, r#"{"suggestion": "Jog 5km"}"#).unwrap();
    assert_eq!(outcome.filled, 1);
    assert_eq!(grid.cell(5).unwrap(), "Jog 5km");

    let outcome =
        apply_fill(&mut grid, FillMode::Single, &FillTarget::new(5), r#"{"suggestion": "Swim"}"#)
            .unwrap();
    assert_eq!(outcome.filled, 0);
    assert_eq!(grid.cell(5).unwrap(), "Jog 5km");
}

#[test]
fn unusable_responses_leave_the_grid_untouched() {
    let mut grid = health();
    let before = grid.clone();
    let target = FillTarget::with_seed(5, "typed");

    let err = apply_fill(&mut grid, FillMode::Block, &target, "no json at all").unwrap_err();
    assert!(matches!(err, AiError::Parse(_)));
    let err = apply_fill(&mut grid, FillMode::Block, &target, "[]").unwrap_err();
    assert_eq!(err, AiError::EmptyResponse);
    let err = apply_fill(&mut grid, FillMode::Full, &target, r#"{"theme": "x"}"#).unwrap_err();
    assert!(matches!(err, AiError::Parse(_)));

    assert_eq!(grid, before);
}
