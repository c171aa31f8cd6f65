use mandala_core::model::layout::global_index;
use mandala_core::repo::chart_store::GRID_KEY;
use mandala_core::{ChartSettings, ChartStore, ColorTheme, Grid, SqliteChartStore, StoreError};

#[test]
fn grid_and_settings_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chart.sqlite3");

    let mut grid = Grid::new();
    grid.set_main_theme("Health");
    grid.set_cell(global_index(4, 7), "Sleep").unwrap();
    let mut settings = ChartSettings::default();
    settings.color_theme = ColorTheme::Gold;

    {
        let store = SqliteChartStore::open(&path).unwrap();
        store.save_grid(&grid).unwrap();
        store.save_settings(&settings).unwrap();
    }

    let store = SqliteChartStore::open(&path).unwrap();
    assert_eq!(store.load_grid().unwrap(), Some(grid));
    assert_eq!(store.load_settings().unwrap(), Some(settings));
}

#[test]
fn saving_twice_keeps_one_row() {
    let store = SqliteChartStore::in_memory().unwrap();
    store.save_grid(&Grid::new()).unwrap();
    let mut grid = Grid::new();
    grid.set_main_theme("Work");
    store.save_grid(&grid).unwrap();

    let rows: i64 = store
        .connection()
        .query_row("SELECT COUNT(*) FROM kv_store WHERE key = ?1;", [GRID_KEY], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(store.load_grid().unwrap().unwrap().main_theme(), "Work");
}

#[test]
fn clear_grid_removes_the_blob_only() {
    let store = SqliteChartStore::in_memory().unwrap();
    store.save_grid(&Grid::new()).unwrap();
    store.save_settings(&ChartSettings::default()).unwrap();

    store.clear_grid().unwrap();
    assert!(store.load_grid().unwrap().is_none());
    assert!(store.load_settings().unwrap().is_some());
}

#[test]
fn non_json_blob_is_corrupt() {
    let store = SqliteChartStore::in_memory().unwrap();
    store
        .connection()
        .execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, 'not json');",
            [GRID_KEY],
        )
        .unwrap();
    assert!(matches!(
        store.load_grid(),
        Err(StoreError::Corrupt { .. })
    ));
}
