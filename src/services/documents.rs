use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::config::DocumentSettings;
use crate::core::{country_code, CountryCode};
use crate::models::JobPosting;
use crate::services::openai::{CompletionRequest, LanguageModel, LlmError};

/// Errors while preparing application documents
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("No resume configured: set documents.resume_path or documents.profile_text")]
    MissingResume,

    #[error("Resume text is too short ({len} characters, need at least {min})")]
    ResumeTooShort { len: usize, min: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Language model error: {0}")]
    Llm(#[from] LlmError),
}

/// Paths written for one posting
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDocuments {
    pub dir: PathBuf,
    pub resume: PathBuf,
    pub cover_letter: PathBuf,
}

/// Writes a tailored resume and cover letter per posting
pub struct DocumentGenerator {
    model: Arc<dyn LanguageModel>,
    resume: String,
    output_dir: PathBuf,
    max_documents: usize,
}

impl DocumentGenerator {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        resume: String,
        settings: &DocumentSettings,
    ) -> Result<Self, DocumentError> {
        let len = resume.trim().chars().count();
        if len < settings.min_resume_chars {
            return Err(DocumentError::ResumeTooShort {
                len,
                min: settings.min_resume_chars,
            });
        }

        Ok(Self {
            model,
            resume,
            output_dir: settings.output_dir.clone(),
            max_documents: settings.max_documents,
        })
    }

    /// Load the resume from `resume_path`, falling back to `profile_text`
    pub async fn from_settings(
        model: Arc<dyn LanguageModel>,
        settings: &DocumentSettings,
    ) -> Result<Self, DocumentError> {
        let resume = match (&settings.resume_path, &settings.profile_text) {
            (Some(path), _) => {
                tracing::info!("Loading resume from {}", path.display());
                tokio::fs::read_to_string(path).await?
            }
            (None, Some(text)) => text.clone(),
            (None, None) => return Err(DocumentError::MissingResume),
        };

        let generator = Self::new(model, resume, settings)?;
        tracing::info!("Resume loaded ({} characters)", generator.resume.chars().count());
        Ok(generator)
    }

    pub fn max_documents(&self) -> usize {
        self.max_documents
    }

    /// Generate documents for one posting; `index` is 1-based
    pub async fn generate(&self, posting: &JobPosting, index: usize) -> Result<GeneratedDocuments, DocumentError> {
        let country = country_code(posting.location.as_deref());

        let resume = self
            .model
            .complete(&CompletionRequest::new(resume_prompt(&self.resume, posting, country)))
            .await?;
        let cover_letter = self
            .model
            .complete(&CompletionRequest::new(cover_letter_prompt(&self.resume, posting, country)))
            .await?;

        let dir = self.output_dir.join(document_dir_name(&posting.company, index));
        tokio::fs::create_dir_all(&dir).await?;

        let docs = GeneratedDocuments {
            resume: dir.join("resume.txt"),
            cover_letter: dir.join("cover_letter.txt"),
            dir,
        };
        tokio::fs::write(&docs.resume, resume).await?;
        tokio::fs::write(&docs.cover_letter, cover_letter).await?;

        Ok(docs)
    }

    /// Generate for the first `max_documents` postings and flag each one.
    /// Returns how many succeeded.
    pub async fn generate_all(&self, postings: &mut [JobPosting]) -> usize {
        let mut generated = 0;
        let limit = self.max_documents.min(postings.len());

        for (i, posting) in postings.iter_mut().take(limit).enumerate() {
            tracing::info!(
                "{}. {} at {} ({})",
                i + 1,
                posting.title,
                posting.company,
                country_code(posting.location.as_deref()).as_str()
            );

            match self.generate(posting, i + 1).await {
                Ok(docs) => {
                    tracing::debug!("Documents written to {}", docs.dir.display());
                    posting.documents_generated = Some(true);
                    generated += 1;
                }
                Err(e) => {
                    tracing::error!("Document generation failed for {}: {}", posting.company, e);
                    posting.documents_generated = Some(false);
                }
            }
        }

        generated
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// `<Company>_<n>` with path-unsafe characters replaced
pub fn document_dir_name(company: &str, index: usize) -> String {
    let safe: String = company
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    format!("{}_{}", safe, index)
}

fn resume_prompt(resume: &str, posting: &JobPosting, country: CountryCode) -> String {
    format!(
        "You are an expert resume writer. Tailor this resume to match the job description.\n\n\
         Resume Format Requirements ({code}):\n{format}\n\n\
         Current Resume:\n{resume}\n\n\
         Job Title: {title}\nCompany: {company}\nJob Description:\n{description}\n\n\
         Highlight relevant skills, use keywords from the job description, follow the {code} \
         format, stay truthful and keep it ATS-friendly.\n\n\
         Return only the tailored resume text.",
        code = country.as_str(),
        format = country.resume_format(),
        resume = resume,
        title = posting.title,
        company = posting.company,
        description = posting.description_text(),
    )
}

fn cover_letter_prompt(resume: &str, posting: &JobPosting, country: CountryCode) -> String {
    format!(
        "Write a compelling cover letter for this job application.\n\n\
         Resume:\n{resume}\n\n\
         Job Title: {title}\nJob Description:\n{description}\n\n\
         Company: {company}\nCountry: {code}\n\n\
         Be specific to the role and company, highlight relevant achievements, follow {code} \
         business writing conventions and stay under 350 words.\n\n\
         Return only the cover letter text.",
        resume = resume,
        title = posting.title,
        description = posting.description_text(),
        company = posting.company,
        code = country.as_str(),
    )
}
