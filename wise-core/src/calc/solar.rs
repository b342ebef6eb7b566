use super::{exact_fields, Calculation, ResponseShape};
use crate::wire::WireField;
use chrono::{NaiveDate, NaiveTime};
use log::warn;
use serde::{Deserialize, Serialize};
use wise_utils::dates;

/// Sun times for a location on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarCalculation {
    pub date: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
    /// Hours from UTC of the answer's local time.
    pub utc_offset: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SolarResult {
    pub is_calculated: bool,
    pub sunrise: Option<NaiveTime>,
    pub solar_noon: Option<NaiveTime>,
    pub sunset: Option<NaiveTime>,
}

impl Calculation for SolarCalculation {
    type Output = SolarResult;

    const COMMAND: &'static str = "SOLAR";
    const SHAPE: ResponseShape = ResponseShape::Fields(3);

    fn payload(&self) -> Vec<String> {
        let fields = [
            self.date.to_field(),
            self.latitude.to_field(),
            self.longitude.to_field(),
            self.utc_offset.to_field(),
        ];
        vec![fields.join("|")]
    }

    fn parse(&self, response: &str) -> SolarResult {
        let Some(fields) = exact_fields(Self::COMMAND, response, 3) else {
            return SolarResult::default();
        };
        let mut times = Vec::with_capacity(3);
        for field in fields {
            match dates::parse_time(field) {
                Ok(time) => times.push(time),
                Err(e) => {
                    warn!("SOLAR response field '{field}': {e}");
                    return SolarResult::default();
                }
            }
        }
        SolarResult {
            is_calculated: true,
            sunrise: times.first().copied(),
            solar_noon: times.get(1).copied(),
            sunset: times.get(2).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SolarCalculation {
        SolarCalculation {
            date: NaiveDate::from_ymd_opt(2019, 6, 21).unwrap(),
            latitude: 53.5,
            longitude: -113.5,
            utc_offset: -6.0,
        }
    }

    #[test]
    fn test_payload() {
        assert_eq!(request().payload(), vec!["2019-06-21|53.5|-113.5|-6"]);
    }

    #[test]
    fn test_parse_times() {
        let result = request().parse("05:03:41|13:35:12|22:06:44\n");
        assert!(result.is_calculated);
        assert_eq!(result.sunrise, NaiveTime::from_hms_opt(5, 3, 41));
        assert_eq!(result.sunset, NaiveTime::from_hms_opt(22, 6, 44));
    }

    #[test]
    fn test_unparseable_time() {
        assert!(!request().parse("dawn|13:35:12|22:06:44\n").is_calculated);
    }
}
