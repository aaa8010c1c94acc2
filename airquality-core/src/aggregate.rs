use crate::{
    model::{AirQualityReading, Coordinate},
    provider::AirQualityProvider,
};

/// Consult `primary`, then `fallback` only if the primary did not succeed.
///
/// The returned reading is the primary's on success, otherwise whatever the
/// fallback produced (which may itself be a failure).
pub async fn aggregate(
    primary: &dyn AirQualityProvider,
    fallback: &dyn AirQualityProvider,
    coord: Coordinate,
) -> AirQualityReading {
    let reading = primary.reading(coord).await;
    if reading.is_ok() {
        return reading;
    }

    tracing::info!(
        primary = %primary.source(),
        fallback = %fallback.source(),
        "primary provider failed, falling back"
    );

    fallback.reading(coord).await
}
