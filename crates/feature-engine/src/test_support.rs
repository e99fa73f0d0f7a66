//! Synthetic activity logs for unit tests

use sensor_log::RawSample;

/// Synthetic log: `per_sensor` accelerometer and gyroscope records in the
/// given on-disk order, each axis a distinct sinusoid.
pub fn synthetic_log(per_sensor: usize, gyro_first: bool) -> Vec<RawSample> {
    let accel = |i: usize| {
        let t = i as f64 / 50.0;
        [
            (2.0 * std::f64::consts::PI * 2.0 * t).sin() + 0.3,
            (2.0 * std::f64::consts::PI * 3.0 * t).cos() * 2.0 + 9.81,
            (i % 7) as f64 - 2.5,
        ]
    };
    let gyro = |i: usize| {
        let t = i as f64 / 50.0;
        [
            (2.0 * std::f64::consts::PI * 5.0 * t).sin() * 0.5 + 0.05,
            (i % 11) as f64 * 0.1 - 0.4,
            (2.0 * std::f64::consts::PI * 1.0 * t).sin() + (i % 3) as f64 * 0.01,
        ]
    };

    let accel_rows = (0..per_sensor).map(|i| RawSample::new("Accelerometer", &i.to_string(), accel(i)).unwrap());
    let gyro_rows = (0..per_sensor).map(|i| RawSample::new("Gyroscope", &i.to_string(), gyro(i)).unwrap());

    if gyro_first {
        gyro_rows.chain(accel_rows).collect()
    } else {
        accel_rows.chain(gyro_rows).collect()
    }
}
