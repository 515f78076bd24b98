// FMI WFS time-value-pair observations -> ObservationResponse
use crate::application::error::AppError;
use crate::domain::observation::{
    ObservationLocation, ObservationMeta, ObservationResponse, ObservationSeries, Sample,
    OBSERVATION_PARAMETERS,
};
use crate::infrastructure::xml::{parse_document, XmlElement};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

pub const PROVIDER: &str = "FMI observation";
const CREDIT_TEXT: &str = "Ilmatieteenlaitos.fi (CC BY 4.0)";
const CREDIT_URL: &str = "https://en.ilmatieteenlaitos.fi/open-data";

const SAMPLING_FEATURE: [&str; 2] = ["om:featureOfInterest", "sams:SF_SpatialSamplingFeature"];

pub fn parameter_codes() -> impl Iterator<Item = &'static str> {
    OBSERVATION_PARAMETERS.iter().map(|(_, code)| *code)
}

fn feature_id(observation: &XmlElement) -> Option<&str> {
    observation
        .path(&SAMPLING_FEATURE)
        .and_then(|feature| feature.attr("gml:id"))
}

fn text_at<'a>(element: &'a XmlElement, path: &[&str]) -> Option<&'a str> {
    element.path(path).and_then(XmlElement::text)
}

fn parse_series(observation: &XmlElement, code: &str) -> Result<ObservationSeries, AppError> {
    let timeseries = observation
        .path(&["om:result", "wml2:MeasurementTimeseries"])
        .ok_or_else(|| AppError::parse(PROVIDER, format!("series '{code}' has no measurement timeseries")))?;

    let samples = timeseries
        .children_named("wml2:point")
        .map(|point| {
            let time = text_at(point, &["wml2:MeasurementTVP", "wml2:time"])
                .ok_or_else(|| AppError::parse(PROVIDER, format!("series '{code}' has a point without time")))?;
            let time = DateTime::parse_from_rfc3339(time)
                .map_err(|e| AppError::parse(PROVIDER, format!("invalid time '{time}' in series '{code}': {e}")))?
                .with_timezone(&Utc);
            let value = text_at(point, &["wml2:MeasurementTVP", "wml2:value"])
                .and_then(|raw| raw.parse::<f64>().ok())
                .unwrap_or(f64::NAN);
            Ok(Sample { time, value })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(ObservationSeries::from_samples(samples))
}

fn parse_location(reference: &XmlElement) -> ObservationLocation {
    let feature = reference.path(&SAMPLING_FEATURE);
    let point = feature.and_then(|f| f.path(&["sams:shape", "gml:Point"]));
    let mut coordinates = point
        .and_then(|p| text_at(p, &["gml:pos"]))
        .unwrap_or_default()
        .split_whitespace()
        .map(|part| part.parse::<f64>().ok());

    ObservationLocation {
        place: point.and_then(|p| text_at(p, &["gml:name"])).map(str::to_string),
        region: feature
            .and_then(|f| {
                text_at(
                    f,
                    &[
                        "sam:sampledFeature",
                        "target:LocationCollection",
                        "target:member",
                        "target:Location",
                        "target:region",
                    ],
                )
            })
            .map(str::to_string),
        latitude: coordinates.next().flatten(),
        longitude: coordinates.next().flatten(),
    }
}

/// Normalise a `fmi::observations::weather::timevaluepair` response.
/// Every parameter in [`OBSERVATION_PARAMETERS`] must be present.
pub fn parse_observations(xml: &[u8]) -> Result<ObservationResponse, AppError> {
    let root = parse_document(xml).map_err(|e| AppError::parse(PROVIDER, e))?;
    if root.name != "wfs:FeatureCollection" {
        return Err(AppError::parse(
            PROVIDER,
            format!("expected wfs:FeatureCollection, got <{}>", root.name),
        ));
    }

    let observations: Vec<&XmlElement> = root
        .children_named("wfs:member")
        .filter_map(|member| member.child("omso:PointTimeSeriesObservation"))
        .collect();

    let mut by_name: BTreeMap<&str, &XmlElement> = BTreeMap::new();
    for (name, code) in OBSERVATION_PARAMETERS {
        let observation = observations
            .iter()
            .find(|observation| feature_id(observation).is_some_and(|id| id.ends_with(code)))
            .ok_or_else(|| AppError::parse(PROVIDER, format!("no observation series for parameter '{code}'")))?;
        by_name.insert(name, *observation);
    }

    let reference = by_name
        .get("temperature")
        .copied()
        .ok_or_else(|| AppError::parse(PROVIDER, "temperature series missing"))?;
    let period = reference.path(&["om:phenomenonTime", "gml:TimePeriod"]);

    let meta = ObservationMeta {
        timestamp: root.attr("timeStamp").map(str::to_string),
        start_time: period
            .and_then(|p| text_at(p, &["gml:beginPosition"]))
            .map(str::to_string),
        end_time: period
            .and_then(|p| text_at(p, &["gml:endPosition"]))
            .map(str::to_string),
        credit_text: CREDIT_TEXT.to_string(),
        credit_url: CREDIT_URL.to_string(),
    };

    let mut series = BTreeMap::new();
    for (name, code) in OBSERVATION_PARAMETERS {
        if let Some(observation) = by_name.get(name) {
            series.insert(name.to_string(), parse_series(observation, code)?);
        }
    }

    Ok(ObservationResponse {
        location: parse_location(reference),
        meta,
        series,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::observation::OBSERVATION_PARAMETERS;

    fn member(code: &str, points: &[(&str, &str)]) -> String {
        let points: String = points
            .iter()
            .map(|(time, value)| {
                format!(
                    "<wml2:point><wml2:MeasurementTVP><wml2:time>{time}</wml2:time>\
                     <wml2:value>{value}</wml2:value></wml2:MeasurementTVP></wml2:point>"
                )
            })
            .collect();
        format!(
            r#"<wfs:member><omso:PointTimeSeriesObservation gml:id="obs-{code}">
              <om:phenomenonTime><gml:TimePeriod>
                <gml:beginPosition>2024-01-15T09:20:00Z</gml:beginPosition>
                <gml:endPosition>2024-01-15T10:30:00Z</gml:endPosition>
              </gml:TimePeriod></om:phenomenonTime>
              <om:featureOfInterest>
                <sams:SF_SpatialSamplingFeature gml:id="fi-1-1-{code}">
                  <sam:sampledFeature><target:LocationCollection><target:member><target:Location>
                    <target:region codeSpace="http://xml.fmi.fi/namespace/location/region">Helsinki</target:region>
                  </target:Location></target:member></target:LocationCollection></sam:sampledFeature>
                  <sams:shape><gml:Point>
                    <gml:name>Helsinki Kaisaniemi</gml:name>
                    <gml:pos>60.17523 24.94459 </gml:pos>
                  </gml:Point></sams:shape>
                </sams:SF_SpatialSamplingFeature>
              </om:featureOfInterest>
              <om:result><wml2:MeasurementTimeseries gml:id="ts-{code}">{points}</wml2:MeasurementTimeseries></om:result>
            </omso:PointTimeSeriesObservation></wfs:member>"#
        )
    }

    /// A collection with every parameter; temperature and rain amount get
    /// the given samples, the rest a single constant sample.
    pub fn observation_xml(temperature: &[(&str, &str)], rain_amount: &[(&str, &str)]) -> String {
        let members: String = OBSERVATION_PARAMETERS
            .iter()
            .map(|(_, code)| match *code {
                "t2m" => member(code, temperature),
                "r_1h" => member(code, rain_amount),
                _ => member(code, &[("2024-01-15T10:30:00Z", "1.0")]),
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <wfs:FeatureCollection timeStamp="2024-01-15T10:31:07Z" numberMatched="7" numberReturned="7">{members}</wfs:FeatureCollection>"#
        )
    }
}
