//! Builtin catalog of supported conversions
//!
//! Pure data: each entry pairs a source and target format with the display
//! metadata the UI needs. Constructed once at startup, read-only thereafter.

use once_cell::sync::Lazy;
use serde::Serialize;

/// A catalog entry describing one supported conversion pairing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionOption {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub from_format: &'static str,
    pub to_format: &'static str,
    pub icon: &'static str,
}

/// All conversions the app offers
pub static CONVERSION_OPTIONS: Lazy<Vec<ConversionOption>> = Lazy::new(|| {
    vec![
        ConversionOption {
            id: "docx-to-pdf",
            title: "Word to PDF",
            description: "Convert Word documents to PDF",
            from_format: "docx",
            to_format: "pdf",
            icon: "pi pi-file-word",
        },
        ConversionOption {
            id: "pdf-to-docx",
            title: "PDF to Word",
            description: "Convert PDF files to editable Word documents",
            from_format: "pdf",
            to_format: "docx",
            icon: "pi pi-file-pdf",
        },
        ConversionOption {
            id: "xlsx-to-pdf",
            title: "Excel to PDF",
            description: "Convert Excel spreadsheets to PDF",
            from_format: "xlsx",
            to_format: "pdf",
            icon: "pi pi-file-excel",
        },
        ConversionOption {
            id: "pptx-to-pdf",
            title: "PowerPoint to PDF",
            description: "Convert presentations to PDF",
            from_format: "pptx",
            to_format: "pdf",
            icon: "pi pi-desktop",
        },
        ConversionOption {
            id: "jpg-to-png",
            title: "JPG to PNG",
            description: "Convert JPG images to PNG",
            from_format: "jpg",
            to_format: "png",
            icon: "pi pi-image",
        },
        ConversionOption {
            id: "png-to-jpg",
            title: "PNG to JPG",
            description: "Convert PNG images to JPG",
            from_format: "png",
            to_format: "jpg",
            icon: "pi pi-image",
        },
        ConversionOption {
            id: "webp-to-png",
            title: "WebP to PNG",
            description: "Convert WebP images to PNG",
            from_format: "webp",
            to_format: "png",
            icon: "pi pi-image",
        },
        ConversionOption {
            id: "html-to-pdf",
            title: "HTML to PDF",
            description: "Convert web pages to PDF",
            from_format: "html",
            to_format: "pdf",
            icon: "pi pi-globe",
        },
        ConversionOption {
            id: "txt-to-pdf",
            title: "Text to PDF",
            description: "Convert plain text files to PDF",
            from_format: "txt",
            to_format: "pdf",
            icon: "pi pi-align-left",
        },
        ConversionOption {
            id: "csv-to-xlsx",
            title: "CSV to Excel",
            description: "Convert CSV files to Excel spreadsheets",
            from_format: "csv",
            to_format: "xlsx",
            icon: "pi pi-table",
        },
    ]
});

/// Look up a catalog entry by id
pub fn find_option(id: &str) -> Option<&'static ConversionOption> {
    CONVERSION_OPTIONS.iter().find(|option| option.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_is_non_empty_and_well_formed() {
        assert!(!CONVERSION_OPTIONS.is_empty());
        for option in CONVERSION_OPTIONS.iter() {
            assert!(!option.from_format.is_empty());
            assert!(!option.to_format.is_empty());
            assert_ne!(option.from_format, option.to_format);
        }
    }

    #[test]
    fn catalog_ids_are_unique() {
        let ids: HashSet<_> = CONVERSION_OPTIONS.iter().map(|o| o.id).collect();
        assert_eq!(ids.len(), CONVERSION_OPTIONS.len());
    }

    #[test]
    fn find_option_matches_by_id() {
        let option = find_option("docx-to-pdf").unwrap();
        assert_eq!(option.from_format, "docx");
        assert_eq!(option.to_format, "pdf");
        assert!(find_option("nope").is_none());
    }
}
