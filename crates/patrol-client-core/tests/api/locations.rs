use patrol_shared::location::{Kpis, LocationState};
use reqwest::{Method, StatusCode};
use serde_json::json;

use crate::helpers::{fixtures, signed_in};

#[tokio::test]
async fn snapshot_is_normalized() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(
        Method::GET,
        "/ubicaciones",
        StatusCode::OK,
        fixtures::three_locations(),
    );

    // Act
    let snapshot = client.locations().await.unwrap();

    // Assert
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot[1].state, LocationState::Active);
    assert_eq!(snapshot[1].lng, -90.51);
    let kpis = Kpis::from_snapshot(&snapshot);
    assert_eq!((kpis.total, kpis.active, kpis.inactive), (3, 2, 1));
}

#[tokio::test]
async fn geojson_snapshot() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(
        Method::GET,
        "/ubicaciones",
        StatusCode::OK,
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-90.5, 14.6]},
                "properties": {"nombre": "P-09", "estado": "activa"}
            }]
        }),
    );

    // Act
    let snapshot = client.locations().await.unwrap();

    // Assert
    assert_eq!(snapshot.len(), 1);
    assert_eq!((snapshot[0].lat, snapshot[0].lng), (14.6, -90.5));
    assert_eq!(snapshot[0].identity, "P-09");
}

#[tokio::test]
async fn empty_body_is_empty_snapshot() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_sequence(
        Method::GET,
        "/ubicaciones",
        vec![patrol_client_core::RawResponse::new(StatusCode::OK, "")],
    );

    // Act
    let snapshot = client.locations().await.unwrap();

    // Assert
    assert!(snapshot.is_empty());
}
