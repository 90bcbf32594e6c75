/// Station registry for the water-quality monitoring service.
///
/// Compiled-in coordinates of the monitoring stations shown on the map,
/// grouped by river. Only the map uses this table: river and station
/// membership for averaging comes from the loaded CSV, so a station that is
/// missing here still contributes to the chart and metrics.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// Location of a single monitoring station.
#[derive(Debug)]
pub struct Station {
    /// Station name as it appears in the CSV station column.
    pub name: &'static str,
    /// River the station belongs to, as it appears in the CSV river column.
    pub river: &'static str,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
}

/// A map marker for the report's map section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// All stations with known coordinates, grouped by river.
///
/// Coordinates are approximate marker positions, not surveyed station
/// locations.
pub static STATION_REGISTRY: &[Station] = &[
    Station {
        name: "한강대교",
        river: "한강",
        latitude: 37.5665,
        longitude: 126.9780,
    },
    Station {
        name: "잠실",
        river: "한강",
        latitude: 37.5326,
        longitude: 126.9900,
    },
    Station {
        name: "뚝섬",
        river: "한강",
        latitude: 37.5147,
        longitude: 127.0500,
    },
    Station {
        name: "공촌천",
        river: "공촌천",
        latitude: 37.5255,
        longitude: 126.6575,
    },
    Station {
        name: "장수천",
        river: "장수천",
        latitude: 37.4529,
        longitude: 126.7025,
    },
];

/// Distinct rivers that have at least one located station.
pub fn mapped_rivers() -> Vec<&'static str> {
    let mut rivers: Vec<&'static str> = Vec::new();
    for station in STATION_REGISTRY {
        if !rivers.contains(&station.river) {
            rivers.push(station.river);
        }
    }
    rivers
}

/// Located stations of `river`, in registry order.
pub fn stations_for_river(river: &str) -> Vec<&'static Station> {
    STATION_REGISTRY.iter().filter(|s| s.river == river).collect()
}

/// Map markers for `river`, or `None` when the river has no location data.
pub fn map_points(river: &str) -> Option<Vec<MapPoint>> {
    let points: Vec<MapPoint> = stations_for_river(river)
        .into_iter()
        .map(|s| MapPoint {
            name: s.name.to_string(),
            lat: s.latitude,
            lon: s.longitude,
        })
        .collect();

    if points.is_empty() { None } else { Some(points) }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
