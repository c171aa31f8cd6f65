use mandala_core::model::layout::{
    block_index, global_index, local_index, mirror_of, BLOCK_CENTERS, MAIN_THEME_INDEX,
    SATELLITE_BLOCKS,
};
use mandala_core::{ClearScope, Grid, GridError};

#[test]
fn index_mapping_matches_known_cells() {
    assert_eq!((block_index(0), local_index(0)), (0, 0));
    assert_eq!((block_index(40), local_index(40)), (4, 4));
    assert_eq!((block_index(80), local_index(80)), (8, 8));
    assert_eq!(global_index(3, 4), 37);
    assert_eq!(global_index(4, 3), 39);
    assert_eq!(global_index(5, 0), 33);
}

#[test]
fn index_mapping_is_a_bijection() {
    for index in 0..81 {
        assert_eq!(global_index(block_index(index), local_index(index)), index);
    }
}

#[test]
fn mirror_pairs_are_symmetric_and_only_sub_theme_cells_have_one() {
    let mut with_mirror = 0;
    for index in 0..81 {
        if let Some(mirror) = mirror_of(index) {
            assert_eq!(mirror_of(mirror), Some(index));
            with_mirror += 1;
        }
    }
    assert_eq!(with_mirror, 16);
    assert_eq!(mirror_of(MAIN_THEME_INDEX), None);
}

#[test]
fn setting_either_side_of_a_pair_updates_both() {
    let mut grid = Grid::new();
    grid.set_cell(global_index(4, 0), "Diet").unwrap();
    assert_eq!(grid.cell(10).unwrap(), "Diet");

    grid.set_cell(10, "Sleep").unwrap();
    assert_eq!(grid.cell(30).unwrap(), "Sleep");
    assert!(grid.mirror_violations().is_empty());
}

#[test]
fn clearing_the_meta_block_clears_every_satellite_center() {
    let mut grid = Grid::new();
    grid.set_main_theme("Health");
    for &block in &SATELLITE_BLOCKS {
        grid.set_sub_theme(block, format!("sub {block}")).unwrap();
        grid.set_block_cell(block, 0, "action").unwrap();
    }

    assert_eq!(grid.clear_area_at(40).unwrap(), ClearScope::All);
    assert!(grid.is_empty());

    grid.set_sub_theme(8, "Money").unwrap();
    grid.set_block_cell(8, 0, "Save").unwrap();
    grid.clear_block(4).unwrap();
    assert!(grid.sub_theme(8).unwrap().is_empty());
    assert_eq!(grid.block_cell(8, 0).unwrap(), "Save");
}

#[test]
fn area_clear_requires_a_block_center() {
    let mut grid = Grid::new();
    grid.set_sub_theme(2, "Work").unwrap();
    grid.set_block_cell(2, 1, "Ship").unwrap();

    assert!(matches!(
        grid.clear_area_at(0),
        Err(GridError::NotABlockCenter(0))
    ));
    assert_eq!(grid.clear_area_at(BLOCK_CENTERS[2]).unwrap(), ClearScope::Block(2));
    assert!(grid.sub_theme(2).unwrap().is_empty());
    assert!(grid.block_cell(4, 2).unwrap().is_empty());
    assert!(grid.block_cell(2, 1).unwrap().is_empty());
}

#[test]
fn grid_json_is_a_flat_array_and_repairs_pairs() {
    let mut cells = vec![String::new(); 81];
    cells[30] = "Diet".to_string();
    let grid: Grid = serde_json::from_str(&serde_json::to_string(&cells).unwrap()).unwrap();
    assert_eq!(grid.cell(10).unwrap(), "Diet");

    let json = serde_json::to_value(&grid).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 81);

    let short = serde_json::from_str::<Grid>("[\"a\"]");
    assert!(short.is_err());
}
