use crate::stats::aggregate::*;

#[test]
fn test_nan_mean_skips_nan() {
    assert_eq!(nan_mean(&[1.0, f64::NAN, 3.0]), 2.0);
    assert!(nan_mean(&[f64::NAN, f64::NAN]).is_nan());
    assert!(nan_mean(&[]).is_nan());
}

#[test]
fn test_trend_uses_first_and_last_valid() {
    assert_eq!(trend(&[f64::NAN, 0.1, 0.4, f64::NAN, 0.6]), Some(0.6 - 0.1));
    assert_eq!(trend(&[0.3, f64::NAN]), None);
    assert_eq!(trend(&[]), None);
}
