use std::time::Duration;

use mmwave_hardware::error::HwError;
use mmwave_hardware::{ScriptedSource, SimulatedRadar};
use mmwave_traits::{FrameSource, RawFrame};
use rstest::rstest;

const T: Duration = Duration::from_millis(100);

#[rstest]
fn scripted_source_can_disconnect() {
    let mut s = ScriptedSource::from_frames([RawFrame::empty()]).disconnect_when_done();
    assert!(s.read_frame(T).unwrap().is_some());
    let err = s.read_frame(T).unwrap_err();
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Disconnected)));
}

#[rstest]
#[case(0.0, 0)]
#[case(1.0, 200)]
fn dropout_extremes(#[case] dropout: f32, #[case] expected_empty: usize) {
    let mut r = SimulatedRadar::new(42).with_people(2).with_dropout(dropout);
    let mut empty = 0;
    for _ in 0..100 {
        let f = r.read_frame(T).unwrap().unwrap();
        empty += f.readings[..2].iter().filter(|x| !x.present).count();
        assert!(!f.readings[2].present, "third slot unused");
    }
    assert_eq!(empty, expected_empty);
}

#[rstest]
fn partial_dropout_is_partial() {
    let mut r = SimulatedRadar::new(9).with_dropout(0.5);
    let present = (0..400)
        .filter(|_| r.read_frame(T).unwrap().unwrap().readings[0].present)
        .count();
    assert!((100..300).contains(&present), "present {present}");
}
