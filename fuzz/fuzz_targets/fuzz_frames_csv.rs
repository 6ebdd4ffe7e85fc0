#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(frames) = mmwave_config::read_frames_csv(data) {
        // Successful parses are strictly ordered by timestamp
        assert!(frames.windows(2).all(|w| w[0].t_ms < w[1].t_ms));
    }
});
