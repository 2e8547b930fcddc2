use serde::{Deserialize, Serialize};

pub const PASS: &str = "PASS";

/// A diploid genotype. Alleles are indexes into the variant allele list, 0 is REF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Call {
    pub alleles: [u16; 2],
    pub phased: bool,
}

impl Call {
    pub fn unphased(a: u16, b: u16) -> Self {
        Self {
            alleles: [a, b],
            phased: false,
        }
    }

    pub fn phased(a: u16, b: u16) -> Self {
        Self {
            alleles: [a, b],
            phased: true,
        }
    }

    pub fn hom_ref() -> Self {
        Self::unphased(0, 0)
    }

    pub fn is_hom_ref(&self) -> bool {
        self.alleles == [0, 0]
    }

    pub fn is_het(&self) -> bool {
        self.alleles[0] != self.alleles[1]
    }
}

impl std::fmt::Display for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let sep = if self.phased { '|' } else { '/' };
        write!(f, "{}{sep}{}", self.alleles[0], self.alleles[1])
    }
}

/// Per-entry genotype filter (FORMAT/FT)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterStatus {
    Pass,
    Fail(String),
}

impl FilterStatus {
    /// Parse a FT value, `.` and the empty string are undefined
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" | "." => None,
            PASS => Some(Self::Pass),
            v => Some(Self::Fail(v.to_string())),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl std::fmt::Display for FilterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "{PASS}"),
            Self::Fail(reason) => write!(f, "{reason}"),
        }
    }
}

/// A single matrix entry: the called alleles (GT) and the filter status (FT)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenotypeCall {
    pub gt: Option<Call>,
    pub ft: Option<FilterStatus>,
}

impl GenotypeCall {
    pub fn new(gt: Option<Call>, ft: Option<FilterStatus>) -> Self {
        Self { gt, ft }
    }

    pub fn pass(gt: Call) -> Self {
        Self::new(Some(gt), Some(FilterStatus::Pass))
    }

    pub fn missing() -> Self {
        Self::default()
    }

    pub fn is_missing(&self) -> bool {
        self.gt.is_none()
    }

    /// A call with a defined FT other than PASS is not trusted.
    /// An undefined FT is never masked.
    pub fn is_low_quality(&self) -> bool {
        matches!(&self.ft, Some(ft) if !ft.is_pass())
    }

    /// Replace untrusted calls with a homozygous reference call, FT is kept as is
    pub fn mask(&mut self) {
        if self.is_low_quality() {
            self.gt = Some(Call::hom_ref());
        }
    }

    pub fn masked(&self) -> Self {
        let mut call = self.clone();
        call.mask();
        call
    }

    /// GT:FT as written to a VCF sample column
    pub fn to_vcf_field(&self) -> String {
        let gt = self
            .gt
            .map_or_else(|| String::from("./."), |call| call.to_string());
        let ft = self
            .ft
            .as_ref()
            .map_or_else(|| String::from("."), ToString::to_string);
        format!("{gt}:{ft}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_filter_status() {
        assert_eq!(FilterStatus::parse("PASS"), Some(FilterStatus::Pass));
        assert_eq!(FilterStatus::parse("LowGQ"), Some(FilterStatus::Fail("LowGQ".into())));
        assert_eq!(FilterStatus::parse("."), None);
        assert_eq!(FilterStatus::parse(""), None);
    }

    #[test]
    fn mask_non_pass() {
        let call = GenotypeCall::new(Some(Call::unphased(0, 1)), FilterStatus::parse("LowGQ"));
        assert_eq!(call.masked().gt, Some(Call::hom_ref()));
        assert_eq!(call.masked().ft, Some(FilterStatus::Fail("LowGQ".into())));

        let call = GenotypeCall::new(None, FilterStatus::parse("LowDP"));
        assert_eq!(call.masked().gt, Some(Call::hom_ref()));
    }

    #[test]
    fn keep_pass_and_undefined() {
        let call = GenotypeCall::pass(Call::phased(1, 1));
        assert_eq!(call.masked(), call);

        let call = GenotypeCall::new(Some(Call::unphased(0, 2)), None);
        assert_eq!(call.masked(), call);

        let call = GenotypeCall::missing();
        assert_eq!(call.masked(), call);
    }

    #[test]
    fn mask_is_idempotent() {
        let call = GenotypeCall::new(Some(Call::unphased(1, 2)), FilterStatus::parse("fail"));
        assert_eq!(call.masked().masked(), call.masked());
    }

    #[test]
    fn vcf_field() {
        assert_eq!(GenotypeCall::pass(Call::unphased(0, 1)).to_vcf_field(), "0/1:PASS");
        assert_eq!(GenotypeCall::new(Some(Call::phased(1, 0)), None).to_vcf_field(), "1|0:.");
        assert_eq!(GenotypeCall::missing().to_vcf_field(), "./.:.");
    }
}
