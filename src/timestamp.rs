/// Formats a duration as `HH:MM:SS.mmm`. The hour field grows past two
/// digits when needed.
pub fn time_str(sec: f64) -> String {
    let ms = (sec.max(0.0) * 1000.0).round() as u64;
    let hours = ms / 3_600_000;
    let minutes = ms % 3_600_000 / 60_000;
    let seconds = ms % 60_000 / 1000;
    let milliseconds = ms % 1000;

    format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
}

#[test]
fn formats_durations() {
    assert_eq!(time_str(0.0), "00:00:00.000");
    assert_eq!(time_str(0.032), "00:00:00.032");
    assert_eq!(time_str(3661.5), "01:01:01.500");
    assert_eq!(time_str(360_000.0), "100:00:00.000");
}
