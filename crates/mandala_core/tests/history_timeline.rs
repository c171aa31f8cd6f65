use mandala_core::history::EditSession;
use mandala_core::{Grid, History, HISTORY_LIMIT};

fn grid_with(index: usize, value: &str) -> Grid {
    let mut grid = Grid::new();
    grid.set_cell(index, value).unwrap();
    grid
}

#[test]
fn undo_is_capped_at_the_history_limit() {
    let mut history = History::default();
    for step in 1..=60 {
        history.replace(grid_with(0, &format!("step {step}")));
    }
    assert_eq!(history.undo_depth(), HISTORY_LIMIT);

    let mut undone = 0;
    while history.undo() {
        undone += 1;
    }
    assert_eq!(undone, HISTORY_LIMIT);
    assert_eq!(history.current().cell(0).unwrap(), "step 10");
    assert_eq!(history.redo_depth(), HISTORY_LIMIT);
}

#[test]
fn new_commit_after_undo_drops_redo() {
    let mut history = History::default();
    history.replace(grid_with(0, "a"));
    history.replace(grid_with(0, "b"));
    assert!(history.undo());
    assert!(history.can_redo());

    history.replace(grid_with(0, "c"));
    assert!(!history.can_redo());
    assert!(history.undo());
    assert_eq!(history.current().cell(0).unwrap(), "a");
}

#[test]
fn redo_replays_in_order() {
    let mut history = History::default();
    for value in ["a", "b", "c"] {
        history.replace(grid_with(0, value));
    }
    while history.undo() {}
    assert!(history.current().is_empty());

    assert!(history.redo());
    assert_eq!(history.current().cell(0).unwrap(), "a");
    assert!(history.redo());
    assert_eq!(history.current().cell(0).unwrap(), "b");
}

#[test]
fn edit_session_records_one_step_for_many_keystrokes() {
    let mut history = History::default();
    let edit = EditSession::begin(5, history.current());
    for typed in ["H", "He", "Hea", "Heal", "Health"] {
        history.current_mut().set_cell(edit.index, typed).unwrap();
    }
    assert!(history.commit(edit.before));
    assert_eq!(history.undo_depth(), 1);

    assert!(history.undo());
    assert!(history.current().is_empty());
}

#[test]
fn unchanged_snapshot_is_not_recorded() {
    let mut history = History::default();
    let before = history.current().clone();
    assert!(!history.commit(before));
    assert!(!history.replace(Grid::new()));
    assert!(!history.can_undo());
}
