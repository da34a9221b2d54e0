use invoiceflow::{split_by_null, EtlError, Frame};

fn frame_from(rows: &[(Option<&str>, &str)]) -> Frame {
    let mut frame = Frame::new(vec!["CustomerID".into(), "Other".into()]);
    for (key, other) in rows {
        frame.push_row(vec![key.map(str::to_string), Some((*other).to_string())]);
    }
    frame
}

#[test]
fn splits_on_key_nullability() -> anyhow::Result<()> {
    // "123;A", ";B", "456;C" with the key in position 0.
    let frame = frame_from(&[(Some("123"), "A"), (None, "B"), (Some("456"), "C")]);
    let (unidentified, identified) = split_by_null(&frame, "CustomerID")?;

    assert_eq!(unidentified.len(), 1);
    assert_eq!(unidentified.rows()[0][0], None);
    assert_eq!(unidentified.rows()[0][1].as_deref(), Some("B"));

    assert_eq!(identified.len(), 2);
    assert_eq!(identified.rows()[0][0].as_deref(), Some("123"));
    assert_eq!(identified.rows()[0][1].as_deref(), Some("A"));
    assert_eq!(identified.rows()[1][0].as_deref(), Some("456"));
    assert_eq!(identified.rows()[1][1].as_deref(), Some("C"));
    Ok(())
}

#[test]
fn partitions_are_disjoint_and_complete() -> anyhow::Result<()> {
    let rows: Vec<(Option<&str>, &str)> = (0..97)
        .map(|i| if i % 3 == 0 { (None, "x") } else { (Some("id"), "x") })
        .collect();
    let frame = frame_from(&rows);
    let (unidentified, identified) = split_by_null(&frame, "CustomerID")?;

    assert_eq!(unidentified.len() + identified.len(), frame.len());
    assert!(unidentified.rows().iter().all(|r| r[0].is_none()));
    assert!(identified.rows().iter().all(|r| r[0].is_some()));
    Ok(())
}

#[test]
fn source_order_preserved_within_partitions() -> anyhow::Result<()> {
    let frame = frame_from(&[
        (Some("1"), "a"),
        (None, "b"),
        (Some("2"), "c"),
        (None, "d"),
    ]);
    let (unidentified, identified) = split_by_null(&frame, "CustomerID")?;
    let others = |f: &Frame| {
        f.rows()
            .iter()
            .map(|r| r[1].clone().unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(others(&identified), ["a", "c"]);
    assert_eq!(others(&unidentified), ["b", "d"]);
    Ok(())
}

#[test]
fn missing_key_column_errors() {
    let frame = frame_from(&[(Some("1"), "a")]);
    let err = split_by_null(&frame, "NoSuchColumn").unwrap_err();
    assert!(matches!(err, EtlError::MissingColumn(_)), "got {err:?}");
}
