use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);
    };
}

id_newtype!(VacancyId);
id_newtype!(CompanyId);

/// One vacancy record as the upstream API publishes it.
///
/// The aggregator forwards records as opaque JSON; this typed view is what
/// the presentation layer works with. Every field is defaulted so a sparse
/// or partially malformed record still deserializes instead of poisoning
/// the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vacancy {
    #[serde(rename = "id_posisi", default)]
    pub id: VacancyId,
    #[serde(rename = "posisi", default)]
    pub position: String,
    #[serde(rename = "deskripsi_posisi", default)]
    pub description_html: Option<String>,
    /// JSON-encoded array of `{ "title": ... }` study-program descriptors.
    /// The upstream double-encodes this field; use [`Vacancy::study_programs`].
    #[serde(rename = "program_studi", default)]
    pub study_programs_raw: Option<String>,
    #[serde(rename = "jumlah_terdaftar", default)]
    pub registered: i64,
    #[serde(rename = "jumlah_kuota", default)]
    pub quota: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "perusahaan", default)]
    pub company: Company,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Company {
    #[serde(rename = "id_perusahaan", default)]
    pub id: CompanyId,
    #[serde(rename = "nama_perusahaan", default)]
    pub name: String,
    #[serde(rename = "nama_provinsi", default)]
    pub province: String,
    #[serde(rename = "nama_kabupaten", default)]
    pub regency: String,
    #[serde(rename = "alamat", default)]
    pub address: Option<String>,
    #[serde(rename = "deskripsi_perusahaan", default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyProgram {
    pub title: String,
}

impl Default for VacancyId {
    fn default() -> Self {
        VacancyId(0)
    }
}

impl Default for CompanyId {
    fn default() -> Self {
        CompanyId(0)
    }
}

impl Vacancy {
    /// Decodes the embedded study-program list. Malformed or absent
    /// encoding yields an empty list, never an error.
    pub fn study_programs(&self) -> Vec<StudyProgram> {
        self.study_programs_raw
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    /// Applicants-per-seat ratio used for the competition indicator.
    /// Zero quota reads as no competition rather than a division error.
    pub fn competition_ratio(&self) -> f64 {
        if self.quota > 0 {
            self.registered as f64 / self.quota as f64
        } else {
            0.0
        }
    }
}
