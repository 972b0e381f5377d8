use crate::repositories;

// Legacy department codes from imported invitation data; used only when no
// department row matches.
const DEPARTMENT_CODE_LEXICON: &[(&str, &str)] = &[
    ("CSE", "Computer Science & Engineering"),
    ("EEE", "Electrical & Electronic Engineering"),
    ("BBA", "Business Administration"),
    ("ENG", "English"),
    ("LAW", "Law"),
    ("PHM", "Pharmacy"),
    ("CE", "Civil Engineering"),
    ("ME", "Mechanical Engineering"),
];

pub(crate) fn department_code_name(code: &str) -> Option<&'static str> {
    let upper = code.trim().to_ascii_uppercase();
    DEPARTMENT_CODE_LEXICON
        .iter()
        .find(|(known, _)| *known == upper)
        .map(|(_, name)| *name)
}

/// Display names for an invitation preview.
#[derive(Debug)]
pub(crate) struct DirectoryNames {
    pub(crate) department_name: String,
    pub(crate) institution_name: Option<String>,
}

/// Resolves a department reference to display names: the department itself,
/// falling back to the code lexicon and finally the raw stored value, plus
/// the owning institution when the department row links one.
pub(crate) async fn resolve_directory_names(
    pool: &sqlx::PgPool,
    department_id: &str,
) -> Result<DirectoryNames, sqlx::Error> {
    if let Some(department) = repositories::departments::find_by_id(pool, department_id).await? {
        let institution_name = match department.institution_id.as_deref() {
            Some(institution_id) => Some(resolve_institution_name(pool, institution_id).await?),
            None => None,
        };
        return Ok(DirectoryNames { department_name: department.name, institution_name });
    }

    let department_name = department_code_name(department_id)
        .map(str::to_string)
        .unwrap_or_else(|| department_id.to_string());

    Ok(DirectoryNames { department_name, institution_name: None })
}

async fn resolve_institution_name(
    pool: &sqlx::PgPool,
    institution_id: &str,
) -> Result<String, sqlx::Error> {
    let name = repositories::institutions::find_name_by_id(pool, institution_id).await?;
    Ok(name.unwrap_or_else(|| institution_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicon_lookup_is_case_insensitive() {
        assert_eq!(department_code_name("cse"), Some("Computer Science & Engineering"));
        assert_eq!(department_code_name(" EEE "), Some("Electrical & Electronic Engineering"));
        assert_eq!(department_code_name("unknown-dept"), None);
    }
}
