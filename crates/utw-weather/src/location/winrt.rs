//! WinRT Geolocator. The async operations are awaited with the blocking
//! `get()` on a blocking thread.

use std::time::Duration;

use windows::Devices::Geolocation::{GeolocationAccessStatus, Geolocator};

use crate::types::{Coordinates, Location, LocationError, LocationSource};

pub(super) async fn locate(timeout: Duration) -> Result<Location, LocationError> {
    let task = tokio::task::spawn_blocking(blocking_locate);
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(LocationError::Other(join_error.to_string())),
        Err(_) => Err(LocationError::Timeout),
    }
}

fn blocking_locate() -> Result<Location, LocationError> {
    let access = Geolocator::RequestAccessAsync()
        .and_then(|op| op.get())
        .map_err(map_windows_error)?;
    if access != GeolocationAccessStatus::Allowed {
        return Err(LocationError::PermissionDenied);
    }

    let locator = Geolocator::new().map_err(map_windows_error)?;
    let position = locator
        .GetGeopositionAsync()
        .and_then(|op| op.get())
        .map_err(map_windows_error)?;
    let coordinate = position.Coordinate().map_err(map_windows_error)?;
    let basic = coordinate
        .Point()
        .and_then(|p| p.Position())
        .map_err(map_windows_error)?;

    Ok(Location {
        coordinates: Coordinates::new(basic.Latitude, basic.Longitude)?,
        accuracy_meters: coordinate.Accuracy().ok(),
        source: LocationSource::System,
    })
}

fn map_windows_error(error: windows::core::Error) -> LocationError {
    // E_ACCESSDENIED
    if error.code().0 as u32 == 0x8007_0005 {
        LocationError::PermissionDenied
    } else {
        LocationError::Other(error.message().to_string())
    }
}
