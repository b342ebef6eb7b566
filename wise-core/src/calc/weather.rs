//! Current conditions, forecast cities and hourly forecasts.

use super::{exact_fields, field_groups, number, numbers, Calculation, ResponseShape};
use crate::wire::WireField;
use chrono::{NaiveDate, NaiveDateTime};
use log::warn;
use serde::{Deserialize, Serialize};
use wise_utils::dates;

const OBSERVATION_FIELDS: usize = 7;

/// One hourly weather value, observed or forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub relative_humidity: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub dew_point: f64,
}

impl WeatherObservation {
    fn from_fields(calculator: &str, fields: &[&str]) -> Option<Self> {
        let time = match dates::parse_date_time(fields[0]) {
            Ok(time) => time,
            Err(e) => {
                warn!("{calculator} response field '{}': {e}", fields[0]);
                return None;
            }
        };
        let v = numbers(calculator, &fields[1..])?;
        Some(Self {
            time,
            temperature: v[0],
            relative_humidity: v[1],
            precipitation: v[2],
            wind_speed: v[3],
            wind_direction: v[4],
            dew_point: v[5],
        })
    }
}

/// Conditions at a location and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherCalculation {
    pub latitude: f64,
    pub longitude: f64,
    pub time: NaiveDateTime,
}

impl Calculation for CurrentWeatherCalculation {
    type Output = Option<WeatherObservation>;

    const COMMAND: &'static str = "WEATHER";
    const SHAPE: ResponseShape = ResponseShape::Fields(OBSERVATION_FIELDS);

    fn payload(&self) -> Vec<String> {
        let fields = [self.latitude.to_field(), self.longitude.to_field(), self.time.to_field()];
        vec![fields.join("|")]
    }

    fn parse(&self, response: &str) -> Option<WeatherObservation> {
        let fields = exact_fields(Self::COMMAND, response, OBSERVATION_FIELDS)?;
        WeatherObservation::from_fields(Self::COMMAND, &fields)
    }
}

/// A city with a published forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Cities with forecasts in a province or territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitiesCalculation {
    /// Two-letter code such as `AB`.
    pub province: String,
}

impl Calculation for CitiesCalculation {
    type Output = Vec<ForecastCity>;

    const COMMAND: &'static str = "CITIES";
    const SHAPE: ResponseShape = ResponseShape::Sentinel;

    fn payload(&self) -> Vec<String> {
        vec![self.province.clone()]
    }

    fn parse(&self, response: &str) -> Vec<ForecastCity> {
        field_groups(Self::COMMAND, response, 4)
            .into_iter()
            .filter_map(|group| {
                Some(ForecastCity {
                    id: group[0].to_string(),
                    name: group[1].to_string(),
                    latitude: number(Self::COMMAND, group[2])?,
                    longitude: number(Self::COMMAND, group[3])?,
                })
            })
            .collect()
    }
}

/// Hourly forecast for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCalculation {
    pub city: String,
    pub date: NaiveDate,
    /// Number of forecast days wanted, starting at `date`.
    pub days: u32,
}

impl Calculation for ForecastCalculation {
    type Output = Vec<WeatherObservation>;

    const COMMAND: &'static str = "FORECAST";
    const SHAPE: ResponseShape = ResponseShape::Sentinel;

    fn payload(&self) -> Vec<String> {
        let fields = [self.city.clone(), self.date.to_field(), self.days.to_field()];
        vec![fields.join("|")]
    }

    fn parse(&self, response: &str) -> Vec<WeatherObservation> {
        field_groups(Self::COMMAND, response, OBSERVATION_FIELDS)
            .iter()
            .filter_map(|group| WeatherObservation::from_fields(Self::COMMAND, group))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 6, 12)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_current_weather() {
        let request = CurrentWeatherCalculation {
            latitude: 53.5,
            longitude: -113.5,
            time: noon(),
        };
        assert_eq!(request.payload(), vec!["53.5|-113.5|2019-06-12T12:00:00"]);

        let observation = request
            .parse("2019-06-12T12:00:00|21.5|35|0|12|270|5.4\n")
            .unwrap();
        assert_eq!(observation.time, noon());
        assert_eq!(observation.wind_direction, 270.0);
        assert_eq!(observation.dew_point, 5.4);

        assert!(request.parse("2019-06-12T12:00:00|21.5\n").is_none());
    }

    #[test]
    fn test_cities() {
        let request = CitiesCalculation { province: "AB".into() };
        let cities = request.parse("AB-30|Edmonton|53.55|-113.49\r\nAB-52|Calgary|51.05|-114.07\r\nCOMPLETE\r\n");
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[1].name, "Calgary");
        assert_eq!(cities[1].longitude, -114.07);
    }

    #[test]
    fn test_forecast_skips_bad_groups() {
        let request = ForecastCalculation {
            city: "AB-30".into(),
            date: noon().date(),
            days: 1,
        };
        assert_eq!(request.payload(), vec!["AB-30|2019-06-12|1"]);
        let hours = request.parse(
            "2019-06-12T12:00:00|21.5|35|0|12|270|5.4\n\
             later|22|33|0|14|260|5.1\n\
             2019-06-12T14:00:00|23|31|0|15|255|4.9\n\
             COMPLETE\n",
        );
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[1].temperature, 23.0);
    }

    #[test]
    fn test_forecast_ragged_response_is_empty() {
        let request = ForecastCalculation {
            city: "AB-30".into(),
            date: noon().date(),
            days: 1,
        };
        assert!(request.parse("2019-06-12T12:00:00|21.5|35\nCOMPLETE\n").is_empty());
    }
}
