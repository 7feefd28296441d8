//! Field catalogs for the three inspection kinds
//!
//! Each kind declares its ledger columns once, in column order. A column's
//! shortcut letter is lower-case for the first position angle and upper-case
//! for the second.

use crate::types::KeyStyle;

/// Derived value substituted into a computed column at commit time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSlot {
    G102Coverage,
    G141Coverage,
    G102Contamination,
    G141Contamination,
    CoverageType,
    ContaminationType,
}

/// Column behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 0/1 checkbox
    Flag,
    /// Integer slider `0..=max`, cycled by its shortcut
    Slider { max: u8 },
    /// Placeholder column, always `-1`
    Disabled,
    /// Filled from the metric estimator when the row is written
    Computed(MetricSlot),
}

/// Morphology column groups checked when a record is committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    Image,
    Halpha,
    Process,
}

impl FieldGroup {
    /// Groups that stay disabled until the object's H-alpha maps are shown
    pub fn starts_disabled(self) -> bool {
        matches!(self, FieldGroup::Halpha | FieldGroup::Process)
    }
}

/// One ledger column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub shortcut: char,
    pub kind: FieldKind,
    pub group: Option<FieldGroup>,
}

const fn flag(shortcut: char, name: &'static str) -> FieldDescriptor {
    FieldDescriptor {
        name,
        shortcut,
        kind: FieldKind::Flag,
        group: None,
    }
}

const fn grouped(shortcut: char, name: &'static str, group: FieldGroup) -> FieldDescriptor {
    FieldDescriptor {
        name,
        shortcut,
        kind: FieldKind::Flag,
        group: Some(group),
    }
}

const fn slider(shortcut: char, name: &'static str) -> FieldDescriptor {
    FieldDescriptor {
        name,
        shortcut,
        kind: FieldKind::Slider { max: 4 },
        group: None,
    }
}

const fn disabled(shortcut: char, name: &'static str) -> FieldDescriptor {
    FieldDescriptor {
        name,
        shortcut,
        kind: FieldKind::Disabled,
        group: None,
    }
}

const fn computed(shortcut: char, name: &'static str, slot: MetricSlot) -> FieldDescriptor {
    FieldDescriptor {
        name,
        shortcut,
        kind: FieldKind::Computed(slot),
        group: None,
    }
}

static FLAG_FIELDS: [FieldDescriptor; 26] = [
    flag('a', "G102_Emission_Line"),
    flag('b', "G141_Emission_Line"),
    computed('c', "G102_Spectral_Coverage", MetricSlot::G102Coverage),
    computed('d', "G141_Spectral_Coverage", MetricSlot::G141Coverage),
    flag('e', "G102_Emission_Lines_Multiple"),
    flag('f', "G141_Emission_Lines_Multiple"),
    computed('g', "G102_Contamination_Level", MetricSlot::G102Contamination),
    computed('h', "G141_Contamination_Level", MetricSlot::G141Contamination),
    flag('i', "G102_Defect"),
    flag('j', "G141_Defect"),
    flag('k', "G102_Contam_Defect"),
    computed('l', "Spectral_Coverage_Type", MetricSlot::CoverageType),
    flag('m', "G102_Mild_Contamination"),
    flag('n', "G141_Mild_Contamination"),
    flag('o', "G141_Contam_Defect"),
    computed('p', "Contamination_Level_Type", MetricSlot::ContaminationType),
    flag('q', "G102_Moderate_Contamination"),
    flag('r', "G141_Moderate_Contamination"),
    flag('s', "direct_Defect"),
    disabled('t', "empty7"),
    flag('u', "G102_Severe_Contamination"),
    flag('v', "G141_Severe_Contamination"),
    flag('w', "direct_Star"),
    flag('x', "I_have_no_idea"),
    flag('y', "G102_Continuum"),
    flag('z', "G141_Continuum"),
];

static REDSHIFT_FIELDS: [FieldDescriptor; 8] = [
    slider('a', "G102_zfit_quality"),
    slider('b', "G141_zfit_quality"),
    flag('c', "MgII_detection"),
    flag('d', "OII_detection"),
    disabled('e', "empty1"),
    disabled('f', "empty2"),
    flag('g', "OIII_detection"),
    flag('h', "Ha_detection"),
];

static MORPHOLOGY_FIELDS: [FieldDescriptor; 22] = [
    grouped('a', "Img_Elliptical", FieldGroup::Image),
    grouped('b', "Img_S0", FieldGroup::Image),
    grouped('c', "Img_Spiral", FieldGroup::Image),
    grouped('d', "Img_Hubble_Unclassified", FieldGroup::Image),
    grouped('e', "Img_Irregular", FieldGroup::Image),
    grouped('f', "Img_Merging", FieldGroup::Image),
    grouped('g', "Img_Do_not_know", FieldGroup::Image),
    grouped('h', "Img_Star_Defect", FieldGroup::Image),
    grouped('i', "Ha_Regular", FieldGroup::Halpha),
    grouped('j', "Ha_Clumpy", FieldGroup::Halpha),
    grouped('k', "Ha_Concentrated", FieldGroup::Halpha),
    grouped('l', "Ha_Assymmetric_Jellyfish", FieldGroup::Halpha),
    grouped('m', "Ha_Other", FieldGroup::Halpha),
    grouped('n', "Ha_No_Halpha", FieldGroup::Halpha),
    disabled('o', "empty1"),
    disabled('p', "empty2"),
    grouped('q', "Process_Regular", FieldGroup::Process),
    grouped('r', "Process_Ram_Pressure", FieldGroup::Process),
    grouped('s', "Process_Major_Merger", FieldGroup::Process),
    grouped('t', "Process_Minor_Merger", FieldGroup::Process),
    grouped('u', "Process_Other", FieldGroup::Process),
    flag('x', "Uncertain"),
];

/// Free-text section appended after the columns as `#TAG# text`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    G102Wave,
    G141Wave,
    Comment,
}

impl Section {
    pub fn tag(self) -> &'static str {
        match self {
            Section::G102Wave => "G102wave",
            Section::G141Wave => "G141wave",
            Section::Comment => "C",
        }
    }

    /// `#TAG#` as it appears in a ledger line
    pub fn marker(self) -> String {
        format!("#{}#", self.tag())
    }
}

static FLAG_SECTIONS: [Section; 3] = [Section::G102Wave, Section::G141Wave, Section::Comment];
static COMMENT_ONLY: [Section; 1] = [Section::Comment];

/// The three inspection tools sharing one ledger engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Spectral flags with computed coverage and contamination columns
    Flags,
    /// Redshift-fit quality with a by-hand redshift block
    Redshift,
    /// Postage-stamp morphology keyed by cluster
    Morphology,
}

impl SessionKind {
    pub fn fields(self) -> &'static [FieldDescriptor] {
        match self {
            SessionKind::Flags => &FLAG_FIELDS,
            SessionKind::Redshift => &REDSHIFT_FIELDS,
            SessionKind::Morphology => &MORPHOLOGY_FIELDS,
        }
    }

    pub fn sections(self) -> &'static [Section] {
        match self {
            SessionKind::Flags => &FLAG_SECTIONS,
            SessionKind::Redshift | SessionKind::Morphology => &COMMENT_ONLY,
        }
    }

    pub fn key_style(self) -> KeyStyle {
        match self {
            SessionKind::Morphology => KeyStyle::Cluster,
            SessionKind::Flags | SessionKind::Redshift => KeyStyle::PositionAngle,
        }
    }

    /// Whether rows carry the `<z> <quality> <multiple>` by-hand block
    pub fn has_by_hand_redshift(self) -> bool {
        self == SessionKind::Redshift
    }

    /// Whether committed rows need coverage and contamination estimates
    pub fn computes_metrics(self) -> bool {
        self.fields()
            .iter()
            .any(|field| matches!(field.kind, FieldKind::Computed(_)))
    }

    /// File name used when the configured output is `DEFAULT`
    pub fn default_output_name(self) -> &'static str {
        match self {
            SessionKind::Flags => "visualinspection_defaultoutput.txt",
            SessionKind::Redshift => "visualinspection_z_defaultoutput.txt",
            SessionKind::Morphology => "visualinspection_m_defaultoutput.txt",
        }
    }

    /// Start of the first ledger header line
    pub fn header_title(self) -> &'static str {
        match self {
            SessionKind::Redshift => "Results from Visual Inspection of zfits initiated on",
            SessionKind::Flags | SessionKind::Morphology => {
                "Results from Visual Inspection initiated on"
            }
        }
    }

    /// Column-name comment line written under the two header lines
    pub fn column_header(self) -> String {
        let key = match self.key_style() {
            KeyStyle::PositionAngle => "ID PA",
            KeyStyle::Cluster => "ID cluster",
        };
        let mut header = format!("# {}", key);
        for field in self.fields() {
            header.push(' ');
            header.push_str(field.name);
        }
        if self.has_by_hand_redshift() {
            header.push_str(" byhandredshift byhandredshift_quality multiple_redshift_solutions");
        }
        header.push(' ');
        header
    }

    /// Column index for a shortcut letter, either case
    pub fn field_index(self, shortcut: char) -> Option<usize> {
        let shortcut = shortcut.to_ascii_lowercase();
        self.fields()
            .iter()
            .position(|field| field.shortcut == shortcut)
    }

    pub fn field_named(self, name: &str) -> Option<usize> {
        self.fields().iter().position(|field| field.name == name)
    }
}
