//! Post entity - Annuncio (oggetto o servizio) con geolocalizzazione

use super::enums::PostKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const PLACEHOLDER_POST_IMAGE: &str =
    "https://static-00.iconduck.com/assets.00/profile-circle-icon-512x512-zxne30hp.png";

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance in kilometres (haversine)
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Post {
    pub post_id: String,
    pub owner_id: String,
    pub kind: PostKind,
    pub title: String,
    pub description: String,
    pub category: String,
    pub images: Vec<String>,
    pub location: Option<GeoPoint>,
    pub address: String,
    pub exchange_options: Vec<String>,
    pub views: u64,
    pub viewers: BTreeSet<String>,
    pub likes: BTreeSet<String>,
    pub like_count: u64,
    // vuoto finché il servizio 2D->3D non completa
    pub model_url: String,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn cover_image(&self) -> &str {
        self.images
            .first()
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER_POST_IMAGE)
    }
}
