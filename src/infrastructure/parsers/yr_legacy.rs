// Yr legacy XML forecast (weatherdata/forecast/tabular) -> ForecastResponse
use super::celsius;
use crate::application::error::AppError;
use crate::domain::forecast::{
    ForecastLocation, ForecastMeta, ForecastPoint, ForecastResponse, Precipitation, SunTimes,
    Temperature, Wind,
};
use crate::infrastructure::xml::{parse_document, XmlElement};

pub const PROVIDER: &str = "Yr forecast";

fn required<'a>(element: &'a XmlElement, path: &[&str]) -> Result<&'a XmlElement, AppError> {
    element
        .path(path)
        .ok_or_else(|| AppError::parse(PROVIDER, format!("missing element {}", path.join("/"))))
}

fn text(element: &XmlElement, path: &[&str]) -> Option<String> {
    element.path(path).and_then(XmlElement::text).map(str::to_string)
}

fn attr(element: Option<&XmlElement>, name: &str) -> Option<String> {
    element.and_then(|e| e.attr(name)).map(str::to_string)
}

fn number(element: Option<&XmlElement>, name: &str) -> Option<f64> {
    element
        .and_then(|e| e.attr(name))
        .and_then(|raw| raw.trim().parse::<f64>().ok())
}

fn parse_point(time: &XmlElement) -> Result<ForecastPoint, AppError> {
    let time_from = time
        .attr("from")
        .ok_or_else(|| AppError::parse(PROVIDER, "forecast row without 'from' time"))?
        .to_string();

    let symbol = time.child("symbol");
    let temperature = time.child("temperature");
    let unit = temperature.and_then(|t| t.attr("unit")).unwrap_or("celsius");
    let precipitation = time.child("precipitation");
    let wind_direction = time.child("windDirection");

    Ok(ForecastPoint {
        time_from,
        time_to: attr(Some(time), "to"),
        weather_code: attr(symbol, "var"),
        weather_text: attr(symbol, "name"),
        temperature: Temperature {
            value: number(temperature, "value").map(|value| celsius(value, unit, PROVIDER)),
            min_value: None,
            max_value: None,
            unit: "celsius".to_string(),
        },
        pressure_hpa: number(time.child("pressure"), "value"),
        precipitation: Precipitation {
            value: number(precipitation, "value"),
            min_value: number(precipitation, "minvalue"),
            max_value: number(precipitation, "maxvalue"),
            probability: None,
        },
        wind: Wind {
            speed_meters_per_second: number(time.child("windSpeed"), "mps"),
            direction_code: attr(wind_direction, "code"),
            direction_degrees: number(wind_direction, "deg"),
        },
        cloud_percentage: None,
        relative_humidity: None,
    })
}

pub fn parse_forecast(xml: &[u8]) -> Result<ForecastResponse, AppError> {
    let root = parse_document(xml).map_err(|e| AppError::parse(PROVIDER, e))?;
    if root.name != "weatherdata" {
        return Err(AppError::parse(
            PROVIDER,
            format!("expected <weatherdata>, got <{}>", root.name),
        ));
    }

    let location = required(&root, &["location"])?;
    let position = location.child("location");
    let meta = root.child("meta");
    let link = root.path(&["credit", "link"]);
    let sun = root.child("sun");

    let forecast = required(&root, &["forecast", "tabular"])?
        .children_named("time")
        .map(parse_point)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ForecastResponse {
        location: ForecastLocation {
            city: text(location, &["name"]),
            country: text(location, &["country"]),
            latitude: number(position, "latitude"),
            longitude: number(position, "longitude"),
            altitude: number(position, "altitude"),
        },
        meta: ForecastMeta {
            last_update: meta.and_then(|m| text(m, &["lastupdate"])),
            next_update: meta.and_then(|m| text(m, &["nextupdate"])),
            credit_text: attr(link, "text").unwrap_or_default(),
            credit_url: attr(link, "url").unwrap_or_default(),
        },
        sun: sun.map(|sun| SunTimes {
            rise: attr(Some(sun), "rise"),
            set: attr(Some(sun), "set"),
        }),
        forecast,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const FORECAST_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<weatherdata>
  <location>
    <name>Helsinki</name>
    <type>Capital</type>
    <country>Finland</country>
    <location altitude="13" latitude="60.16952" longitude="24.93545" geobase="geonames" geobaseid="658225" />
  </location>
  <credit>
    <link text="Weather forecast from Yr, delivered by the Norwegian Meteorological Institute and NRK" url="http://www.yr.no/place/Finland/Uusimaa/Helsinki/" />
  </credit>
  <meta>
    <lastupdate>2019-02-10T12:07:00</lastupdate>
    <nextupdate>2019-02-11T00:00:00</nextupdate>
  </meta>
  <sun rise="2019-02-10T08:16:46" set="2019-02-10T16:42:22" />
  <forecast>
    <tabular>
      <time from="2019-02-10T13:00:00" to="2019-02-10T14:00:00">
        <symbol number="4" numberEx="4" name="Cloudy" var="04" />
        <precipitation value="0" />
        <windDirection deg="198.4" code="SSW" name="South-southwest" />
        <windSpeed mps="4.6" name="Gentle breeze" />
        <temperature unit="celsius" value="-1" />
        <pressure unit="hPa" value="1003.1" />
      </time>
      <time from="2019-02-10T14:00:00" to="2019-02-10T15:00:00">
        <symbol number="46" numberEx="46" name="Light rain" var="46" />
        <precipitation value="0.3" minvalue="0.1" maxvalue="0.5" />
        <windDirection deg="201.0" code="SSW" name="South-southwest" />
        <windSpeed mps="5.1" name="Gentle breeze" />
        <temperature unit="fahrenheit" value="32" />
        <pressure unit="hPa" value="1002.4" />
      </time>
      <time from="2019-02-10T15:00:00" to="2019-02-10T16:00:00">
        <symbol number="3" numberEx="3" name="Partly cloudy" var="03d" />
        <precipitation value="0" />
        <windDirection deg="205.2" code="SSW" name="South-southwest" />
        <windSpeed mps="4.9" name="Gentle breeze" />
        <temperature unit="celsius" value="-2" />
        <pressure unit="hPa" value="1002.0" />
      </time>
    </tabular>
  </forecast>
</weatherdata>"#;
}
