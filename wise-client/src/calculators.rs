//! Typed calculator calls on top of [`WireClient`].

use crate::{
    error::Result,
    protocol::{Request, WireClient},
};
use wise_core::calc::{
    fbp::{FbpCalculation, FbpResult},
    fuels::{FuelDefaults, FuelDefaultsRequest, FuelSummary, ListFuels},
    fwi::{FwiCalculation, FwiResult},
    solar::{SolarCalculation, SolarResult},
    weather::{
        CitiesCalculation, CurrentWeatherCalculation, ForecastCalculation, ForecastCity,
        WeatherObservation,
    },
    Calculation,
};

impl WireClient {
    /// Run any calculator and parse its answer.
    pub async fn calculate<C: Calculation>(&self, calculation: &C) -> Result<C::Output> {
        let response = self.send(Request::calculation(calculation))?.await?;
        Ok(calculation.parse(&response.body))
    }

    pub async fn fbp(&self, calculation: &FbpCalculation) -> Result<FbpResult> {
        self.calculate(calculation).await
    }

    pub async fn fwi(&self, calculation: &FwiCalculation) -> Result<FwiResult> {
        self.calculate(calculation).await
    }

    pub async fn solar(&self, calculation: &SolarCalculation) -> Result<SolarResult> {
        self.calculate(calculation).await
    }

    pub async fn current_weather(
        &self,
        calculation: &CurrentWeatherCalculation,
    ) -> Result<Option<WeatherObservation>> {
        self.calculate(calculation).await
    }

    pub async fn forecast_cities(&self, province: &str) -> Result<Vec<ForecastCity>> {
        self.calculate(&CitiesCalculation {
            province: province.to_string(),
        })
        .await
    }

    pub async fn forecast(&self, calculation: &ForecastCalculation) -> Result<Vec<WeatherObservation>> {
        self.calculate(calculation).await
    }

    pub async fn list_fuels(&self) -> Result<Vec<FuelSummary>> {
        self.calculate(&ListFuels).await
    }

    pub async fn fuel_defaults(&self) -> Result<Vec<FuelDefaults>> {
        self.calculate(&FuelDefaultsRequest).await
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::{
        tests::{fake_builder, patient_builder},
        FetchState, WireClient,
    };
    use chrono::NaiveDate;
    use wise_core::calc::fbp::FbpCalculation;

    fn c1() -> FbpCalculation {
        FbpCalculation {
            fuel_type: "C-1".into(),
            latitude: 55.0,
            longitude: -120.0,
            elevation: 0.0,
            slope: 15.0,
            aspect: 0.0,
            wind_speed: 20.0,
            wind_direction: 0.0,
            ffmc: 90.0,
            dmc: 35.5,
            dc: 275.0,
            bui: None,
            start_time: NaiveDate::from_ymd_opt(2019, 6, 12)
                .unwrap()
                .and_hms_opt(13, 0, 0)
                .unwrap(),
            elapsed_time: 60.0,
            crown_base_height: None,
            percent_conifer: None,
            percent_dead_fir: None,
            grass_curing: None,
            grass_fuel_load: None,
        }
    }

    #[tokio::test]
    async fn test_fbp_over_loopback() {
        let (config, server) = fake_builder(
            "8.5|8.1|8.5|0.6|1.9|1.8|3200|3200|220|1.2|1.2|0|0.3|1.5|0.2|0.2|0|10.4|97|22.4|0.75|9.1|1.3|Intermittent crown|180\n",
        )
        .await;
        let client = WireClient::new(config);
        let result = client.fbp(&c1()).await.unwrap();
        assert!(result.is_calculated);
        assert_eq!(result.perimeter, 1.3);
        assert!(server.await.unwrap().starts_with("STARTUP\nFBP\nC-1|55|-120|"));
    }

    #[tokio::test]
    async fn test_short_fbp_reply_is_not_calculated() {
        let (config, server) = patient_builder("8.5|8.1|8.5\n").await;
        let client = WireClient::new(config);
        let result = client.fbp(&c1()).await.unwrap();
        assert!(!result.is_calculated);
        assert_eq!(client.state(), FetchState::Completed);
        assert!(server.await.unwrap().ends_with("SHUTDOWN\n"));
    }

    #[tokio::test]
    async fn test_list_fuels_without_final_line_break() {
        let (config, _server) = patient_builder("C-1|Spruce-Lichen Woodland\r\nCOMPLETE").await;
        let client = WireClient::new(config);
        let fuels = client.list_fuels().await.unwrap();
        assert_eq!(fuels.len(), 1);
        assert_eq!(fuels[0].description, "Spruce-Lichen Woodland");
    }

    #[tokio::test]
    async fn test_list_fuels_over_loopback() {
        let (config, _server) =
            fake_builder("C-1|Spruce-Lichen Woodland\r\nD-1|Leafless Aspen\r\nCOMPLETE\r\n").await;
        let client = WireClient::new(config);
        let fuels = client.list_fuels().await.unwrap();
        assert_eq!(fuels.len(), 2);
        assert_eq!(fuels[1].name, "D-1");
        assert_eq!(client.state(), FetchState::Completed);
    }

    #[tokio::test]
    async fn test_fuel_defaults_over_loopback() {
        let (config, _server) = fake_builder("O-1a|0|0|0|60|0.35|17\nCOMPLETE\n").await;
        let client = WireClient::new(config);
        let defaults = client.fuel_defaults().await.unwrap();
        assert_eq!(defaults[0].flags, 0b0001_0001);
    }
}
