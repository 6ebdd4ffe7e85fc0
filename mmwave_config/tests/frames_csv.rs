use std::fs::File;
use std::io::Write;

use mmwave_config::{load_frames_csv, read_frames_csv};
use mmwave_traits::RawReading;
use rstest::rstest;
use tempfile::tempdir;

#[rstest]
fn groups_rows_by_timestamp() {
    let csv = "\
t_ms,slot,x,y,speed,resolution
0,0,0.2,0.2,0.0,0.36
0,2,-1.0,2.0,0.5,0.36
100,0,0.25,0.2,0.1,0.36
200,1,0.0,0.0,0.0,0
";
    let frames = read_frames_csv(csv.as_bytes()).unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].t_ms, 0);
    assert_eq!(
        frames[0].frame.readings[0],
        RawReading::present(0.2, 0.2, 0.0, 0.36)
    );
    assert!(!frames[0].frame.readings[1].present);
    assert!(frames[0].frame.readings[2].present);
    assert_eq!(frames[1].t_ms, 100);
    // resolution 0 marks an empty slot; the frame itself still exists
    assert_eq!(frames[2].t_ms, 200);
    assert!(frames[2].frame.readings.iter().all(|r| !r.present));
}

#[rstest]
#[case("t_ms,slot,x,y,speed\n0,0,0,0,0\n", "must have headers")]
#[case("t_ms,slot,x,y,speed,resolution\n0,3,0,0,0,0.3\n", "slot 3 out of range")]
#[case(
    "t_ms,slot,x,y,speed,resolution\n100,0,0,1,0,0.3\n50,0,0,1,0,0.3\n",
    "goes backwards"
)]
#[case(
    "t_ms,slot,x,y,speed,resolution\n0,1,0,1,0,0.3\n0,1,0,2,0,0.3\n",
    "appears twice"
)]
#[case("t_ms,slot,x,y,speed,resolution\nzero,0,0,1,0,0.3\n", "invalid CSV row 2")]
fn rejects_malformed_input(#[case] csv: &str, #[case] needle: &str) {
    let err = read_frames_csv(csv.as_bytes()).unwrap_err();
    assert!(
        format!("{err}").contains(needle),
        "error '{err}' does not mention '{needle}'"
    );
}

#[rstest]
fn loads_from_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("frames.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "t_ms,slot,x,y,speed,resolution").unwrap();
    writeln!(f, "0,0,0.5,1.0,0.0,0.36").unwrap();
    drop(f);

    let frames = load_frames_csv(&path).unwrap();
    assert_eq!(frames.len(), 1);
    assert!(load_frames_csv(&dir.path().join("missing.csv")).is_err());
}
