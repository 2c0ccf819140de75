//! GeoClue2 over the system D-Bus.
//!
//! Properties are read through `org.freedesktop.DBus.Properties` directly so
//! the polled `Location` path is never served from a proxy cache.

use std::time::Duration;

use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};
use zbus::{Connection, Proxy};

use crate::types::{Coordinates, Location, LocationError, LocationSource};

const SERVICE: &str = "org.freedesktop.GeoClue2";
const MANAGER_PATH: &str = "/org/freedesktop/GeoClue2/Manager";
const MANAGER_IFACE: &str = "org.freedesktop.GeoClue2.Manager";
const CLIENT_IFACE: &str = "org.freedesktop.GeoClue2.Client";
const LOCATION_IFACE: &str = "org.freedesktop.GeoClue2.Location";
const PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";

const DESKTOP_ID: &str = "under-the-weather";
/// GClueAccuracyLevel::City
const ACCURACY_CITY: u32 = 4;
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub(super) async fn locate(timeout: Duration) -> Result<Location, LocationError> {
    let conn = Connection::system().await.map_err(map_dbus_error)?;

    let manager = Proxy::new(&conn, SERVICE, MANAGER_PATH, MANAGER_IFACE)
        .await
        .map_err(map_dbus_error)?;
    let client_path: OwnedObjectPath = manager
        .call("GetClient", &())
        .await
        .map_err(map_dbus_error)?;
    tracing::debug!("GeoClue client at {}", client_path.as_str());

    let client = Proxy::new(&conn, SERVICE, client_path.as_str(), CLIENT_IFACE)
        .await
        .map_err(map_dbus_error)?;
    let client_props = Proxy::new(&conn, SERVICE, client_path.as_str(), PROPERTIES_IFACE)
        .await
        .map_err(map_dbus_error)?;

    set_property(&client_props, CLIENT_IFACE, "DesktopId", Value::from(DESKTOP_ID)).await?;
    set_property(
        &client_props,
        CLIENT_IFACE,
        "RequestedAccuracyLevel",
        Value::from(ACCURACY_CITY),
    )
    .await?;

    let _: () = client.call("Start", &()).await.map_err(map_dbus_error)?;

    let result = tokio::time::timeout(timeout, wait_for_fix(&conn, &client_props))
        .await
        .unwrap_or(Err(LocationError::Timeout));

    let stopped: zbus::Result<()> = client.call("Stop", &()).await;
    if let Err(e) = stopped {
        tracing::debug!("GeoClue Stop failed: {}", e);
    }

    result
}

async fn wait_for_fix(conn: &Connection, client_props: &Proxy<'_>) -> Result<Location, LocationError> {
    loop {
        let path: OwnedObjectPath = get_property(client_props, CLIENT_IFACE, "Location").await?;
        if path.as_str() != "/" {
            return read_location(conn, &path).await;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn read_location(conn: &Connection, path: &OwnedObjectPath) -> Result<Location, LocationError> {
    let props = Proxy::new(conn, SERVICE, path.as_str(), PROPERTIES_IFACE)
        .await
        .map_err(map_dbus_error)?;

    let latitude: f64 = get_property(&props, LOCATION_IFACE, "Latitude").await?;
    let longitude: f64 = get_property(&props, LOCATION_IFACE, "Longitude").await?;
    let accuracy: f64 = get_property(&props, LOCATION_IFACE, "Accuracy").await?;

    let location = Location {
        coordinates: Coordinates::new(latitude, longitude)?,
        accuracy_meters: Some(accuracy),
        source: LocationSource::System,
    };
    tracing::info!(
        "Located via GeoClue: {} (±{:.0} m)",
        location.coordinates.display_short(),
        accuracy
    );
    Ok(location)
}

async fn get_property<T>(props: &Proxy<'_>, iface: &str, name: &str) -> Result<T, LocationError>
where
    T: TryFrom<OwnedValue>,
    T::Error: std::fmt::Display,
{
    let value: OwnedValue = props
        .call("Get", &(iface, name))
        .await
        .map_err(map_dbus_error)?;
    T::try_from(value).map_err(|e| LocationError::Other(format!("{}.{}: {}", iface, name, e)))
}

async fn set_property(
    props: &Proxy<'_>,
    iface: &str,
    name: &str,
    value: Value<'_>,
) -> Result<(), LocationError> {
    let _: () = props
        .call("Set", &(iface, name, value))
        .await
        .map_err(map_dbus_error)?;
    Ok(())
}

fn map_dbus_error(error: zbus::Error) -> LocationError {
    classify_dbus_message(&error.to_string())
}

fn classify_dbus_message(message: &str) -> LocationError {
    if message.contains("AccessDenied") || message.contains("not allowed") {
        LocationError::PermissionDenied
    } else if message.contains("ServiceUnknown")
        || message.contains("NameHasNoOwner")
        || message.contains("No such file")
        || message.contains("Connection refused")
    {
        LocationError::ServiceUnavailable
    } else {
        LocationError::Other(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_is_permission_denied() {
        let err = classify_dbus_message(
            "org.freedesktop.DBus.Error.AccessDenied: 'under-the-weather' disallowed",
        );
        assert!(matches!(err, LocationError::PermissionDenied));
    }

    #[test]
    fn test_missing_service_is_unavailable() {
        let err = classify_dbus_message(
            "org.freedesktop.DBus.Error.ServiceUnknown: The name org.freedesktop.GeoClue2 was not provided",
        );
        assert!(matches!(err, LocationError::ServiceUnavailable));
    }
}
