use torus_life::Universe;
use torus_life::UniverseError;
use torus_life::parse_rle;
use torus_life::rule_set::RuleSet;

fn live_cells(universe: &Universe) -> Vec<(u32, u32)> {
    (0..universe.height())
        .flat_map(|row| (0..universe.width()).map(move |col| (row, col)))
        .filter(|&(row, col)| universe.cell(row, col).unwrap())
        .collect()
}

fn pattern(name: &str) -> Vec<u8> {
    std::fs::read(format!("tests/rle_pats/{name}.rle")).unwrap()
}

#[test]
fn test_patterns() -> anyhow::Result<()> {
    let pattern_dir = std::fs::read_dir("tests/rle_pats")?;
    let mut tested = 0;
    let mut failed = Vec::new();

    for entry in pattern_dir {
        let path = entry?.path();
        let bytes = std::fs::read(&path)?;

        let mut universe = Universe::dead(64, 64)?;
        match universe.load_rle(&bytes) {
            Ok(_) if universe.population() > 0 => tested += 1,
            Ok(_) => failed.push((path.clone(), "empty pattern".to_string())),
            Err(e) => failed.push((path.clone(), format!("{e:#}"))),
        }
    }

    if !failed.is_empty() {
        for (path, err) in &failed {
            eprintln!("Failed to load {:?}: {}", path, err);
        }

        panic!(
            "{}/{} patterns failed to load",
            failed.len(),
            tested + failed.len()
        );
    }

    assert_eq!(tested, 5);

    Ok(())
}

#[test]
fn glider_is_centred() -> anyhow::Result<()> {
    let bytes = pattern("glider");
    let mut universe = Universe::dead(8, 8)?;

    let file = universe.load_rle(&bytes)?;
    assert_eq!(file.name.as_deref(), Some("Glider"));

    assert_eq!(
        live_cells(&universe),
        [(2, 3), (3, 4), (4, 2), (4, 3), (4, 4)]
    );

    Ok(())
}

#[test]
fn load_replaces_contents() -> anyhow::Result<()> {
    let bytes = pattern("blinker");
    let mut universe = Universe::new(5, 5)?;
    universe.tick();

    universe.load_rle(&bytes)?;

    assert_eq!(universe.generation(), 0);
    assert_eq!(live_cells(&universe), [(2, 1), (2, 2), (2, 3)]);

    universe.tick();
    assert_eq!(live_cells(&universe), [(1, 2), (2, 2), (3, 2)]);

    Ok(())
}

#[test]
fn gosper_glider_gun() -> anyhow::Result<()> {
    let bytes = pattern("gosper_glider_gun");
    let mut cells = 0;

    let file = parse_rle::read_rle(&bytes, |_, _| cells += 1)?;

    assert_eq!(file.size, Some((36, 9)));
    assert_eq!(file.author.as_deref(), Some("Bill Gosper"));
    assert_eq!(cells, 36);

    Ok(())
}

#[test]
fn lwss_travels() -> anyhow::Result<()> {
    let bytes = pattern("lwss");
    let mut universe = Universe::dead(16, 8)?;
    universe.load_rle(&bytes)?;

    let start = live_cells(&universe);
    assert_eq!(start.len(), 9);

    for _ in 0..4 {
        universe.tick();
    }

    // Two cells along the row every four generations, in one direction or the other
    let shifted = |dc: u32| -> Vec<(u32, u32)> {
        let mut cells: Vec<_> = start.iter().map(|&(r, c)| (r, (c + dc) % 16)).collect();
        cells.sort();
        cells
    };

    let now = live_cells(&universe);
    assert!(now == shifted(2) || now == shifted(14), "{now:?}");

    Ok(())
}

#[test]
fn replicator_brings_its_rule() -> anyhow::Result<()> {
    let bytes = pattern("replicator");
    let mut universe = Universe::dead(32, 32)?;

    let file = universe.load_rle(&bytes)?;

    let highlife: RuleSet = "B36/S23".parse()?;
    assert_eq!(universe.rules(), highlife);
    assert_eq!(file.offset, Some((-2, -2)));
    assert_eq!(universe.population(), 12);

    Ok(())
}

#[test]
fn oversized_pattern_wraps() -> anyhow::Result<()> {
    let bytes = pattern("blinker");
    let mut universe = Universe::dead(2, 2)?;

    universe.load_rle(&bytes)?;

    assert_eq!(live_cells(&universe), [(0, 0), (0, 1)]);

    Ok(())
}

#[test]
fn bad_pattern_leaves_universe_alone() -> anyhow::Result<()> {
    let mut universe = Universe::new(8, 8)?;
    let before = universe.cells().to_vec();

    let err = universe.load_rle(b"x = 1, y = 1\nA!").unwrap_err();

    assert!(matches!(err, UniverseError::Rle(_)));
    assert_eq!(universe.cells(), before.as_slice());

    Ok(())
}

#[test]
fn overflowing_runs_are_errors() -> anyhow::Result<()> {
    for input in [
        b"o18446744073709551615b!".as_slice(),
        b"9223372036854775807$o!",
        b"x = 1, y = 18446744073709551615\no!",
    ] {
        let mut universe = Universe::new(8, 8)?;
        let before = universe.cells().to_vec();

        let err = universe.load_rle(input).unwrap_err();

        assert!(matches!(err, UniverseError::Rle(_)), "{err}");
        assert_eq!(universe.cells(), before.as_slice());
    }

    Ok(())
}

#[test]
fn oversized_run_is_rejected() -> anyhow::Result<()> {
    let mut universe = Universe::dead(8, 8)?;

    let err = universe.load_rle(b"4000000000o!").unwrap_err();

    assert!(matches!(err, UniverseError::Rle(_)));
    assert_eq!(universe.population(), 0);

    Ok(())
}

#[test]
fn widest_pattern_wraps() -> anyhow::Result<()> {
    let mut universe = Universe::dead(4, 4)?;

    universe.load_rle(format!("{}o!", parse_rle::MAX_PATTERN_SIDE).as_bytes())?;

    // Every column gets hit, on the row the one-high pattern is centred on
    assert_eq!(live_cells(&universe), [(1, 0), (1, 1), (1, 2), (1, 3)]);

    Ok(())
}
