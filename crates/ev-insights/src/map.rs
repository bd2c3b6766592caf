//! Geographic opportunity map: one point per ZIP sized by predicted sales,
//! plus the camera view for the current selection.

use crate::error::Result;
use crate::types::{CITY, LAT, LON, PREDICTED_SALES, Selection, ZIP};
use crate::utils::{column_mean, f64_values, format_sales, str_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Map centre used when the selection has no rows (continental US).
pub const DEFAULT_CENTER: (f64, f64) = (39.5, -98.35);

pub const CITY_ZOOM: f64 = 8.0;
pub const STATE_ZOOM: f64 = 5.0;
pub const COUNTRY_ZOOM: f64 = 3.5;

/// One plotted ZIP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub zip: String,
    pub city: String,
    pub lat: f64,
    pub lon: f64,
    /// Radius in map units before `radius_scale`; the predicted sales value.
    pub radius: f64,
    pub tooltip: String,
}

/// Fixed rendering parameters for the point layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapStyle {
    pub radius_scale: f64,
    pub radius_min_pixels: f64,
    pub radius_max_pixels: f64,
    /// RGBA
    pub fill_color: [u8; 4],
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            radius_scale: 5.0,
            radius_min_pixels: 3.0,
            radius_max_pixels: 60.0,
            fill_color: [30, 144, 255, 160],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayer {
    pub points: Vec<MapPoint>,
    pub style: MapStyle,
    pub view: MapView,
}

/// Build the point layer and view for the filtered geo rows.
///
/// Rows without coordinates are not plotted. The view centres on the mean
/// coordinate of the selection and zooms in as the selection narrows.
pub fn map_layer(geo: &DataFrame, selection: &Selection) -> Result<MapLayer> {
    let zips = str_values(geo, ZIP)?;
    let cities = str_values(geo, CITY)?;
    let lats = f64_values(geo, LAT)?;
    let lons = f64_values(geo, LON)?;
    let sales = f64_values(geo, PREDICTED_SALES)?;

    let mut points = Vec::with_capacity(geo.height());
    for i in 0..geo.height() {
        let (Some(lat), Some(lon)) = (lats[i], lons[i]) else {
            continue;
        };
        let zip = zips[i].clone().unwrap_or_default();
        let city = cities[i].clone().unwrap_or_default();
        let tooltip = format!(
            "ZIP: {}\nCity: {}\nPredicted sales: {}",
            zip,
            city,
            format_sales(sales[i])
        );
        points.push(MapPoint {
            zip,
            city,
            lat,
            lon,
            radius: sales[i].unwrap_or(0.0),
            tooltip,
        });
    }

    let (latitude, longitude) = match (column_mean(geo, LAT)?, column_mean(geo, LON)?) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => DEFAULT_CENTER,
    };

    Ok(MapLayer {
        points,
        style: MapStyle::default(),
        view: MapView {
            latitude,
            longitude,
            zoom: zoom_for(selection),
        },
    })
}

fn zoom_for(selection: &Selection) -> f64 {
    if !selection.city.is_all() {
        CITY_ZOOM
    } else if !selection.state.is_all() {
        STATE_ZOOM
    } else {
        COUNTRY_ZOOM
    }
}
