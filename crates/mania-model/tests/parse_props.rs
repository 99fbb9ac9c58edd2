use mania_model::{Chart, NoteKind, ScrollVelocity, TimingPoint, parse, parse_timing_points};
use proptest::prelude::*;

fn hit_object_line(x: u32, time: i32, hold: bool, len: u32) -> String {
    if hold {
        format!("{x},192,{time},128,0,{}:0:0:0:0:", time as i64 + len as i64)
    } else {
        format!("{x},192,{time},1,0,0:0:0:0:")
    }
}

proptest! {
    #[test]
    fn parsed_notes_are_sorted(
        objects in prop::collection::vec((0u32..600, -1000i32..200_000, any::<bool>(), 0u32..5000), 0..200),
        columns in 1usize..10,
    ) {
        let mut text = String::from("[HitObjects]\n");
        for (x, t, hold, len) in &objects {
            text.push_str(&hit_object_line(*x, *t, *hold, *len));
            text.push('\n');
        }
        let notes = parse(&text, columns);
        prop_assert_eq!(notes.len(), objects.len());
        for pair in notes.windows(2) {
            prop_assert!(pair[0].time <= pair[1].time);
        }
        for n in &notes {
            prop_assert!(n.column < columns);
            prop_assert!(n.end_time >= n.time);
        }
    }

    #[test]
    fn constant_segment_is_linear(
        mult in 0.1f64..4.0,
        t1 in 0.0f64..10_000.0,
        dt in 0.0f64..10_000.0,
    ) {
        let sv = ScrollVelocity::new(vec![TimingPoint::new(0.0, mult)]);
        let t2 = t1 + dt;
        let d = sv.position_at(t2) - sv.position_at(t1);
        prop_assert!((d - dt * mult).abs() < 1e-6);
    }

    #[test]
    fn position_is_monotonic(
        mults in prop::collection::vec((0u32..100_000, 0.1f64..4.0), 1..30),
        a in 0.0f64..100_000.0,
        b in 0.0f64..100_000.0,
    ) {
        let points = mults.iter().map(|(t, m)| TimingPoint::new(*t as f64, *m)).collect();
        let sv = ScrollVelocity::new(points);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(sv.position_at(lo) <= sv.position_at(hi) + 1e-9);
    }
}

#[test]
fn timing_point_text_round_trip_sorted() {
    let text = "[TimingPoints]\n2000,-200,4,2,0,100,0,0\n0,500,4,2,0,100,1,0\n1000,-50,4,2,0,100,0,0\n";
    let points = parse_timing_points(text);
    let times: Vec<f64> = points.iter().map(|p| p.time).collect();
    assert_eq!(times, vec![0.0, 1000.0, 2000.0]);
    assert_eq!(points[2].cumulative_position, 1000.0 + 1000.0 * 2.0);
    assert_eq!(points[2].multiplier, 0.5);
}

#[test]
fn chart_from_fixture() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-charts/basic_4k.osu");
    let chart = Chart::load(&path, 4).unwrap();
    assert_eq!(chart.metadata.key_count, Some(4));
    assert!(chart.total_notes() > 0);
    assert!(chart.notes.iter().any(|n| n.kind == NoteKind::Hold));
    assert!(chart.warnings.is_empty());
}
