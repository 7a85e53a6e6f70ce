//! Reference data loading from a MasterData directory.
//!
//! Files (all owned by the content-management side, read-only here):
//! - `symptom_Description.csv`  disease,description (required)
//! - `symptom_precaution.csv`   disease,p1..pN
//! - `vaccination_schedule.json`
//! - `aliases.json`             optional alias override
//! - `symptom_features.json`    optional detection vocabulary override

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use super::types::{
    topic_key, AliasTable, FeatureVocabulary, KnowledgeBase, ScheduleEntry, Topic,
    TopicVocabulary,
};
use super::KnowledgeError;

pub const DESCRIPTION_FILE: &str = "symptom_Description.csv";
pub const PRECAUTION_FILE: &str = "symptom_precaution.csv";
pub const SCHEDULE_FILE: &str = "vaccination_schedule.json";
pub const ALIAS_FILE: &str = "aliases.json";
pub const FEATURES_FILE: &str = "symptom_features.json";

/// Load a full knowledge snapshot from `master_dir`.
///
/// `fallback_features` is used when the directory carries no feature list
/// (normally the classifier's own feature order).
pub fn load_knowledge(
    master_dir: &Path,
    fallback_features: &FeatureVocabulary,
) -> Result<KnowledgeBase, KnowledgeError> {
    let mut topics = load_descriptions(&master_dir.join(DESCRIPTION_FILE))?;

    let precaution_path = master_dir.join(PRECAUTION_FILE);
    if precaution_path.exists() {
        attach_precautions(&mut topics, &precaution_path)?;
    } else {
        tracing::warn!(path = %precaution_path.display(), "Precaution file missing");
    }

    let vaccine_schedule = load_schedule(&master_dir.join(SCHEDULE_FILE))?;

    let alias_path = master_dir.join(ALIAS_FILE);
    let aliases = if alias_path.exists() {
        load_aliases(&alias_path)?
    } else {
        AliasTable::builtin()
    };

    let features_path = master_dir.join(FEATURES_FILE);
    let features = if features_path.exists() {
        let raw: Vec<String> = read_json(&features_path)?;
        FeatureVocabulary::new(raw)
    } else {
        fallback_features.clone()
    };

    tracing::info!(
        topics = topics.len(),
        aliases = aliases.len(),
        features = features.len(),
        schedule_rows = vaccine_schedule.len(),
        "Knowledge base loaded"
    );

    Ok(KnowledgeBase {
        topics,
        aliases,
        features,
        vaccine_schedule,
    })
}

fn csv_reader(path: &Path) -> Result<csv::Reader<File>, KnowledgeError> {
    if !path.exists() {
        return Err(KnowledgeError::MissingFile(path.to_path_buf()));
    }
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| KnowledgeError::Csv {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Header rows start with the literal "Disease"; data rows never do.
fn is_header(first_cell: &str) -> bool {
    first_cell.trim().eq_ignore_ascii_case("disease")
}

fn load_descriptions(path: &Path) -> Result<TopicVocabulary, KnowledgeError> {
    let mut reader = csv_reader(path)?;
    let mut topics = TopicVocabulary::new();

    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(line, error = %e, "Skipping bad description row");
                continue;
            }
        };
        let Some(name) = record.get(0) else { continue };
        if line == 0 && is_header(name) {
            continue;
        }

        let mut topic = Topic::new(name);
        if topic.key.is_empty() {
            continue;
        }
        if let Some(desc) = record.get(1) {
            if !desc.trim().is_empty() {
                topic.description = desc.trim().to_string();
            }
        }
        let key = topic.key.clone();
        if !topics.insert(topic) {
            tracing::warn!(key = %key, "Duplicate topic in descriptions, keeping first");
        }
    }

    Ok(topics)
}

fn attach_precautions(topics: &mut TopicVocabulary, path: &Path) -> Result<(), KnowledgeError> {
    let mut reader = csv_reader(path)?;

    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(line, error = %e, "Skipping bad precaution row");
                continue;
            }
        };
        let Some(name) = record.get(0) else { continue };
        if line == 0 && is_header(name) {
            continue;
        }
        let key = topic_key(name);
        if key.is_empty() {
            continue;
        }

        let precautions: Vec<String> = record
            .iter()
            .skip(1)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        if !topics.contains(&key) {
            topics.insert(Topic::new(&key));
        }
        if let Some(topic) = topics.get_mut(&key) {
            topic.precautions = precautions;
        }
    }

    Ok(())
}

fn load_schedule(path: &Path) -> Result<Vec<ScheduleEntry>, KnowledgeError> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Vaccination schedule missing, table will be empty");
        return Ok(Vec::new());
    }
    read_json(path)
}

fn load_aliases(path: &Path) -> Result<AliasTable, KnowledgeError> {
    let raw: BTreeMap<String, String> = read_json(path)?;
    Ok(AliasTable::new(raw))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, KnowledgeError> {
    let raw = std::fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|e| KnowledgeError::Json {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::types::FALLBACK_DESCRIPTION;

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    fn master_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            DESCRIPTION_FILE,
            "Disease,Description\n\
             Fungal infection,\"A fungal infection, also called mycosis.\"\n\
             Malaria,Malaria is spread by mosquitoes.\n\
             malaria ,Duplicate row\n",
        );
        write(
            dir.path(),
            PRECAUTION_FILE,
            "Disease,Precaution_1,Precaution_2,Precaution_3\n\
             Malaria,Consult nearest hospital,avoid oily food,\n\
             Typhoid,eat high calorie vegitables,antiboitic therapy,consult doctor\n",
        );
        write(
            dir.path(),
            SCHEDULE_FILE,
            r#"[{"age": "Birth", "vaccines": ["BCG", "OPV-0"]}]"#,
        );
        dir
    }

    #[test]
    fn loads_descriptions_in_file_order() {
        let dir = master_dir();
        let kb = load_knowledge(dir.path(), &FeatureVocabulary::default()).unwrap();
        let keys: Vec<&str> = kb.topics.keys().collect();
        assert_eq!(keys, vec!["fungal infection", "malaria", "typhoid"]);
        assert_eq!(
            kb.topics.get("Fungal Infection").unwrap().description,
            "A fungal infection, also called mycosis."
        );
        assert_eq!(
            kb.topics.get("malaria").unwrap().description,
            "Malaria is spread by mosquitoes."
        );
    }

    #[test]
    fn precautions_skip_empty_cells() {
        let dir = master_dir();
        let kb = load_knowledge(dir.path(), &FeatureVocabulary::default()).unwrap();
        assert_eq!(
            kb.topics.get("malaria").unwrap().precautions,
            vec!["Consult nearest hospital", "avoid oily food"]
        );
    }

    #[test]
    fn precaution_only_topic_gets_fallback_description() {
        let dir = master_dir();
        let kb = load_knowledge(dir.path(), &FeatureVocabulary::default()).unwrap();
        let typhoid = kb.topics.get("typhoid").unwrap();
        assert_eq!(typhoid.description, FALLBACK_DESCRIPTION);
        assert_eq!(typhoid.precautions.len(), 3);
    }

    #[test]
    fn builtin_aliases_when_no_file() {
        let dir = master_dir();
        let kb = load_knowledge(dir.path(), &FeatureVocabulary::default()).unwrap();
        assert!(kb.aliases.entries().iter().any(|(a, c)| a == "flu" && c == "influenza"));
    }

    #[test]
    fn alias_file_overrides_builtin() {
        let dir = master_dir();
        write(dir.path(), ALIAS_FILE, r#"{"jaundice": "hepatitis a"}"#);
        let kb = load_knowledge(dir.path(), &FeatureVocabulary::default()).unwrap();
        assert_eq!(kb.aliases.len(), 1);
        assert_eq!(kb.aliases.entries()[0].1, "hepatitis a");
    }

    #[test]
    fn features_fall_back_to_classifier_order() {
        let dir = master_dir();
        let fallback = FeatureVocabulary::new(["itching", "skin_rash"]);
        let kb = load_knowledge(dir.path(), &fallback).unwrap();
        assert_eq!(kb.features, fallback);

        write(dir.path(), FEATURES_FILE, r#"["cough", "high_fever"]"#);
        let kb = load_knowledge(dir.path(), &fallback).unwrap();
        assert_eq!(kb.features, FeatureVocabulary::new(["cough", "high_fever"]));
    }

    #[test]
    fn schedule_parsed() {
        let dir = master_dir();
        let kb = load_knowledge(dir.path(), &FeatureVocabulary::default()).unwrap();
        assert_eq!(kb.vaccine_schedule.len(), 1);
        assert_eq!(kb.vaccine_schedule[0].vaccines, vec!["BCG", "OPV-0"]);
    }

    #[test]
    fn missing_schedule_is_empty() {
        let dir = master_dir();
        std::fs::remove_file(dir.path().join(SCHEDULE_FILE)).unwrap();
        let kb = load_knowledge(dir.path(), &FeatureVocabulary::default()).unwrap();
        assert!(kb.vaccine_schedule.is_empty());
    }

    #[test]
    fn missing_descriptions_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_knowledge(dir.path(), &FeatureVocabulary::default()).unwrap_err();
        assert!(matches!(err, KnowledgeError::MissingFile(_)));
    }

    #[test]
    fn malformed_schedule_is_json_error() {
        let dir = master_dir();
        write(dir.path(), SCHEDULE_FILE, "{not json");
        let err = load_knowledge(dir.path(), &FeatureVocabulary::default()).unwrap_err();
        assert!(matches!(err, KnowledgeError::Json { .. }));
    }
}
