use serde::de::Error;
use serde::{Deserialize, Deserializer};

/// Coordinates the weather is requested for.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl<'de> Deserialize<'de> for GeoLocation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Debug, Deserialize)]
        pub struct Inner {
            latitude: f64,
            longitude: f64,
        }

        let inner = Inner::deserialize(deserializer)?;
        if !(-90.0..=90.0).contains(&inner.latitude) {
            return Err(Error::custom(format!("invalid location latitude: {}, must be between -90 and 90", inner.latitude)));
        }

        if !(-180.0..=180.0).contains(&inner.longitude) {
            return Err(Error::custom(format!("invalid location longitude: {}, must be between -180 and 180", inner.longitude)));
        }

        Ok(GeoLocation {
            latitude: inner.latitude,
            longitude: inner.longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_a_valid_location() -> Result<(), serde_json::Error> {
        let location: GeoLocation = serde_json::from_str(r#"{ "latitude": 47.14, "longitude": 7.25 }"#)?;

        assert_eq!(
            location,
            GeoLocation {
                latitude: 47.14,
                longitude: 7.25
            }
        );
        Ok(())
    }

    #[test]
    fn rejects_an_out_of_range_latitude() {
        let result = serde_json::from_str::<GeoLocation>(r#"{ "latitude": 91.0, "longitude": 7.25 }"#);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().starts_with("invalid location latitude: 91"));
    }

    #[test]
    fn rejects_an_out_of_range_longitude() {
        let result = serde_json::from_str::<GeoLocation>(r#"{ "latitude": 47.14, "longitude": -181.5 }"#);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().starts_with("invalid location longitude: -181.5"));
    }
}
