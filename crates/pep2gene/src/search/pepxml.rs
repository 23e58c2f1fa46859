//! TPP pepXML with PeptideProphet / iProphet validation

use super::{Filter, SearchResults};
use crate::peptide::Identification;
use crate::Error;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

#[derive(Default, Debug)]
struct Hit {
    peptide: String,
    modified: Option<String>,
    probability: Option<f64>,
    // Only true while every protein of the hit carries the decoy tag
    decoy: bool,
}

fn attribute(ev: &BytesStart, key: &[u8]) -> Result<Option<String>, Error> {
    match ev.try_get_attribute(key)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

/// Read rank 1 search hits whose probability passes the threshold. Hits
/// without a PeptideProphet or iProphet result are not validated and skipped.
pub fn read<R: BufRead>(reader: R, filter: &Filter) -> Result<SearchResults, Error> {
    let mut reader = Reader::from_reader(reader);
    let mut buf = Vec::new();

    let mut results = SearchResults::default();
    let mut hit: Option<Hit> = None;
    let mut unvalidated = 0;

    let is_decoy = |protein: &str| {
        !filter.decoy_tag.is_empty() && protein.starts_with(filter.decoy_tag.as_str())
    };

    loop {
        let event = reader.read_event_into(&mut buf)?;
        let (ev, empty) = match &event {
            Event::Start(ev) => (Some(ev), false),
            Event::Empty(ev) => (Some(ev), true),
            _ => (None, false),
        };

        if let Some(ev) = ev {
            match ev.local_name().as_ref() {
                b"sample_enzyme" => {
                    if results.enzyme.is_none() {
                        results.enzyme = attribute(ev, b"name")?;
                    }
                }
                b"search_hit" => {
                    let rank = attribute(ev, b"hit_rank")?
                        .map(|rank| rank.parse::<u32>())
                        .transpose()?
                        .unwrap_or(1);
                    hit = match rank {
                        1 => {
                            let peptide = attribute(ev, b"peptide")?.ok_or_else(|| {
                                Error::Malformed("search_hit without peptide".into())
                            })?;
                            let protein = attribute(ev, b"protein")?.unwrap_or_default();
                            Some(Hit {
                                peptide,
                                decoy: is_decoy(&protein),
                                ..Default::default()
                            })
                        }
                        _ => None,
                    };
                    if empty {
                        if let Some(hit) = hit.take() {
                            unvalidated += hit.probability.is_none() as usize;
                        }
                    }
                }
                b"alternative_protein" => {
                    if let Some(hit) = hit.as_mut() {
                        let protein = attribute(ev, b"protein")?.unwrap_or_default();
                        hit.decoy &= is_decoy(&protein);
                    }
                }
                b"modification_info" => {
                    if let Some(hit) = hit.as_mut() {
                        hit.modified = attribute(ev, b"modified_peptide")?;
                    }
                }
                // iProphet follows PeptideProphet inside a hit and takes precedence
                b"peptideprophet_result" | b"interprophet_result" => {
                    if let Some(hit) = hit.as_mut() {
                        if let Some(p) = attribute(ev, b"probability")? {
                            hit.probability = Some(p.parse()?);
                        }
                    }
                }
                _ => {}
            }
        }

        match event {
            Event::End(ref ev) if ev.local_name().as_ref() == b"search_hit" => {
                if let Some(hit) = hit.take() {
                    match hit.probability {
                        None => unvalidated += 1,
                        Some(p) if p < filter.peptide_probability => {}
                        Some(_) if filter.ignore_decoys && hit.decoy => {}
                        Some(_) => {
                            let modified = hit.modified.unwrap_or(hit.peptide);
                            results
                                .identifications
                                .push(Identification::new(modified, 1.0));
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if unvalidated > 0 {
        log::warn!(
            "skipped {} search hits without a PeptideProphet probability",
            unvalidated
        );
    }
    Ok(results)
}

#[cfg(test)]
mod test {
    use super::*;

    const PEPXML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<msms_pipeline_analysis xmlns="http://regis-web.systemsbiology.net/pepXML">
<msms_run_summary base_name="sample">
<sample_enzyme name="trypsin">
<specificity cut="KR" no_cut="P" sense="C"/>
</sample_enzyme>
<spectrum_query spectrum="sample.00010.00010.2" index="1">
<search_result>
<search_hit hit_rank="1" peptide="PEPTIDEK" protein="sp|P1|ONE">
<analysis_result analysis="peptideprophet">
<peptideprophet_result probability="0.99"/>
</analysis_result>
</search_hit>
<search_hit hit_rank="2" peptide="PEPTLDEK" protein="sp|P2|TWO">
<analysis_result analysis="peptideprophet">
<peptideprophet_result probability="0.95"/>
</analysis_result>
</search_hit>
</search_result>
</spectrum_query>
<spectrum_query spectrum="sample.00011.00011.2" index="2">
<search_result>
<search_hit hit_rank="1" peptide="MCCCK" protein="sp|P1|ONE">
<modification_info modified_peptide="M[147]C[160]CCK">
<mod_aminoacid_mass position="1" mass="147.0354"/>
</modification_info>
<analysis_result analysis="peptideprophet">
<peptideprophet_result probability="0.5"/>
</analysis_result>
<analysis_result analysis="interprophet">
<interprophet_result probability="0.9"/>
</analysis_result>
</search_hit>
</search_result>
</spectrum_query>
<spectrum_query spectrum="sample.00012.00012.2" index="3">
<search_result>
<search_hit hit_rank="1" peptide="KEDITPEP" protein="DECOY_sp|P1|ONE">
<alternative_protein protein="DECOY_sp|P3|THREE"/>
<analysis_result analysis="peptideprophet">
<peptideprophet_result probability="0.97"/>
</analysis_result>
</search_hit>
</search_result>
</spectrum_query>
<spectrum_query spectrum="sample.00013.00013.2" index="4">
<search_result>
<search_hit hit_rank="1" peptide="AAAAK" protein="DECOY_sp|P1|ONE">
<alternative_protein protein="sp|P4|FOUR"/>
<analysis_result analysis="peptideprophet">
<peptideprophet_result probability="0.97"/>
</analysis_result>
</search_hit>
</search_result>
</spectrum_query>
<spectrum_query spectrum="sample.00014.00014.2" index="5">
<search_result>
<search_hit hit_rank="1" peptide="LOWK" protein="sp|P1|ONE">
<analysis_result analysis="peptideprophet">
<peptideprophet_result probability="0.2"/>
</analysis_result>
</search_hit>
<search_hit hit_rank="1" peptide="NOPROBK" protein="sp|P1|ONE"/>
</search_result>
</spectrum_query>
</msms_run_summary>
</msms_pipeline_analysis>
"#;

    #[test]
    fn pepxml() {
        let filter = Filter {
            ignore_decoys: true,
            ..Default::default()
        };
        let results = read(PEPXML.as_bytes(), &filter).unwrap();
        assert_eq!(results.enzyme.as_deref(), Some("trypsin"));
        let ids = results
            .identifications
            .iter()
            .map(|id| (id.modified.as_str(), id.sequence.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            ids,
            vec![
                ("PEPTIDEK", "PEPTIDEK"),
                ("M[147]C[160]CCK", "MCCCK"),
                ("AAAAK", "AAAAK")
            ]
        );
    }

    #[test]
    fn pepxml_keeps_decoys() {
        let results = read(PEPXML.as_bytes(), &Filter::default()).unwrap();
        assert_eq!(results.identifications.len(), 4);
    }
}
