use super::{exact_fields, numbers, Calculation, ResponseShape};
use crate::wire::WireField;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const FWI_FIELDS: usize = 9;

/// Equation used to step the hourly FFMC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HourlyFfmcMethod {
    #[default]
    VanWagner = 0,
    Lawson = 1,
}

/// Yesterday's codes plus the current observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FwiCalculation {
    pub time: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub previous_ffmc: f64,
    pub previous_dmc: f64,
    pub previous_dc: f64,
    pub previous_hourly_ffmc: f64,
    pub temperature: f64,
    pub relative_humidity: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub method: HourlyFfmcMethod,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FwiResult {
    pub is_calculated: bool,
    pub daily_ffmc: f64,
    pub hourly_ffmc: f64,
    pub dmc: f64,
    pub dc: f64,
    pub isi: f64,
    pub bui: f64,
    pub fwi: f64,
    pub dsr: f64,
    pub hourly_isi: f64,
}

impl Calculation for FwiCalculation {
    type Output = FwiResult;

    const COMMAND: &'static str = "FWI";
    const SHAPE: ResponseShape = ResponseShape::Fields(FWI_FIELDS);

    fn payload(&self) -> Vec<String> {
        let method = self.method as u8;
        let fields: Vec<String> = crate::wire_fields![
            self.time,
            self.latitude,
            self.longitude,
            self.previous_ffmc,
            self.previous_dmc,
            self.previous_dc,
            self.previous_hourly_ffmc,
            self.temperature,
            self.relative_humidity,
            self.precipitation,
            self.wind_speed,
            method,
        ];
        vec![fields.join("|")]
    }

    fn parse(&self, response: &str) -> FwiResult {
        let Some(v) = exact_fields(Self::COMMAND, response, FWI_FIELDS)
            .and_then(|fields| numbers(Self::COMMAND, &fields))
        else {
            return FwiResult::default();
        };
        FwiResult {
            is_calculated: true,
            daily_ffmc: v[0],
            hourly_ffmc: v[1],
            dmc: v[2],
            dc: v[3],
            isi: v[4],
            bui: v[5],
            fwi: v[6],
            dsr: v[7],
            hourly_isi: v[8],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request() -> FwiCalculation {
        FwiCalculation {
            time: NaiveDate::from_ymd_opt(2019, 6, 12)
                .unwrap()
                .and_hms_opt(13, 0, 0)
                .unwrap(),
            latitude: 54.5,
            longitude: -115.0,
            previous_ffmc: 85.0,
            previous_dmc: 6.0,
            previous_dc: 15.0,
            previous_hourly_ffmc: 85.0,
            temperature: 17.0,
            relative_humidity: 42.0,
            precipitation: 0.0,
            wind_speed: 25.0,
            method: HourlyFfmcMethod::Lawson,
        }
    }

    #[test]
    fn test_payload() {
        assert_eq!(
            request().payload(),
            vec!["2019-06-12T13:00:00|54.5|-115|85|6|15|85|17|42|0|25|1"]
        );
    }

    #[test]
    fn test_parse() {
        let result = request().parse("87.69|86.1|8.55|19.01|10.85|8.49|10.1|1.76|9.9\r\n");
        assert!(result.is_calculated);
        assert_eq!(result.daily_ffmc, 87.69);
        assert_eq!(result.bui, 8.49);
        assert_eq!(result.hourly_isi, 9.9);
    }

    #[test]
    fn test_wrong_arity() {
        let result = request().parse("87.69|86.1|8.55|19.01|10.85|8.49|10.1|1.76|9.9|0\n");
        assert!(!result.is_calculated);
    }
}
