use eframe::egui::Color32;

/// Key into the glyph atlas. Several kinds share one glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GlyphKey {
    User,
    Users,
    Desktop,
    Server,
    Bolt,
    Lock,
    Sitemap,
    Cube,
    Cubes,
    Clipboard,
    Robot,
    Key,
    Cloud,
    Box,
    Window,
    Cog,
    Globe,
    List,
    Landmark,
    Building,
    IdCard,
    Question,
}

impl GlyphKey {
    pub const ALL: [GlyphKey; 22] = [
        Self::User,
        Self::Users,
        Self::Desktop,
        Self::Server,
        Self::Bolt,
        Self::Lock,
        Self::Sitemap,
        Self::Cube,
        Self::Cubes,
        Self::Clipboard,
        Self::Robot,
        Self::Key,
        Self::Cloud,
        Self::Box,
        Self::Window,
        Self::Cog,
        Self::Globe,
        Self::List,
        Self::Landmark,
        Self::Building,
        Self::IdCard,
        Self::Question,
    ];

    /// Drawn for nodes whose kind has no glyph of its own.
    pub const FALLBACK: GlyphKey = GlyphKey::Question;

    /// Icon name producers put in `fontIcon.text` for this glyph.
    pub fn font_icon(self) -> &'static str {
        FONT_ICONS
            .iter()
            .find(|(_, glyph)| *glyph == self)
            .map_or("fa-question", |(name, _)| *name)
    }
}

/// Producer icon names. The first entry per glyph is the one written back.
const FONT_ICONS: &[(&str, GlyphKey)] = &[
    ("fa-user", GlyphKey::User),
    ("fa-users", GlyphKey::Users),
    ("fa-desktop", GlyphKey::Desktop),
    ("fa-server", GlyphKey::Server),
    ("fa-bolt", GlyphKey::Bolt),
    ("fa-lock", GlyphKey::Lock),
    ("fa-sitemap", GlyphKey::Sitemap),
    ("fa-cube", GlyphKey::Cube),
    ("fa-cubes", GlyphKey::Cubes),
    ("fa-clipboard-check", GlyphKey::Clipboard),
    ("fa-clipboard", GlyphKey::Clipboard),
    ("fa-robot", GlyphKey::Robot),
    ("fa-key", GlyphKey::Key),
    ("fa-cloud", GlyphKey::Cloud),
    ("fa-box", GlyphKey::Box),
    ("fa-box-open", GlyphKey::Box),
    ("fa-window-restore", GlyphKey::Window),
    ("fa-object-group", GlyphKey::Window),
    ("fa-cog", GlyphKey::Cog),
    ("fa-globe", GlyphKey::Globe),
    ("fa-th-list", GlyphKey::List),
    ("fa-list", GlyphKey::List),
    ("fa-landmark", GlyphKey::Landmark),
    ("fa-store", GlyphKey::Building),
    ("fa-building", GlyphKey::Building),
    ("fa-id-card", GlyphKey::IdCard),
    ("fa-question", GlyphKey::Question),
];

/// Reads an icon name such as `fa-key` or `fas fa-key`.
pub fn glyph_for_font_icon(text: &str) -> Option<GlyphKey> {
    text.split_whitespace().find_map(|token| {
        FONT_ICONS
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, glyph)| *glyph)
    })
}

struct KindStyle {
    kind: &'static str,
    color: Color32,
    glyph: GlyphKey,
}

const fn kind(kind: &'static str, rgb: [u8; 3], glyph: GlyphKey) -> KindStyle {
    KindStyle {
        kind,
        color: Color32::from_rgb(rgb[0], rgb[1], rgb[2]),
        glyph,
    }
}

const NODE_KINDS: &[KindStyle] = &[
    kind("User", [0x17, 0xE6, 0x25], GlyphKey::User),
    kind("Group", [0xDB, 0xE6, 0x17], GlyphKey::Users),
    kind("Computer", [0xE6, 0x78, 0x73], GlyphKey::Desktop),
    kind("Container", [0xF7, 0x9A, 0x78], GlyphKey::Box),
    kind("Domain", [0x17, 0xE6, 0xB9], GlyphKey::Globe),
    kind("OU", [0xFF, 0xAA, 0x00], GlyphKey::Sitemap),
    kind("GPO", [0x99, 0x8E, 0xFD], GlyphKey::List),
    kind("AIACA", [0x97, 0x69, 0xF0], GlyphKey::Landmark),
    kind("RootCA", [0x69, 0x68, 0xE8], GlyphKey::Landmark),
    kind("EnterpriseCA", [0x46, 0x96, 0xE9], GlyphKey::Building),
    kind("NTAuthStore", [0xD5, 0x75, 0xF5], GlyphKey::Building),
    kind("CertTemplate", [0xB1, 0x53, 0xF3], GlyphKey::IdCard),
    kind("IssuancePolicy", [0x99, 0xB2, 0xDD], GlyphKey::Clipboard),
    kind("AZApp", [0x03, 0xFC, 0x84], GlyphKey::Window),
    kind("AZVMScaleSet", [0x00, 0x7C, 0xD0], GlyphKey::Server),
    kind("AZDevice", [0xB1, 0x8F, 0xCF], GlyphKey::Desktop),
    kind("AZFunctionApp", [0xF4, 0xBA, 0x44], GlyphKey::Bolt),
    kind("AZGroup", [0xF5, 0x7C, 0x9B], GlyphKey::Users),
    kind("AZKeyVault", [0xED, 0x65, 0x8C], GlyphKey::Lock),
    kind("AZManagementGroup", [0xBD, 0x93, 0xD8], GlyphKey::Sitemap),
    kind("AZResourceGroup", [0x89, 0xBD, 0x9E], GlyphKey::Cube),
    kind("AZRole", [0xED, 0x85, 0x37], GlyphKey::Clipboard),
    kind("AZServicePrincipal", [0xC1, 0xD6, 0xD6], GlyphKey::Robot),
    kind("AZSubscription", [0xD2, 0xCC, 0xA1], GlyphKey::Key),
    kind("AZTenant", [0x54, 0xF2, 0xF2], GlyphKey::Cloud),
    kind("AZUser", [0x34, 0xD2, 0xEB], GlyphKey::User),
    kind("AZVM", [0xF9, 0xAD, 0xA0], GlyphKey::Desktop),
    kind("AZManagedCluster", [0x32, 0x6C, 0xE5], GlyphKey::Cubes),
    kind("AZContainerRegistry", [0x08, 0x85, 0xD7], GlyphKey::Box),
    kind("AZWebApp", [0x46, 0x96, 0xE9], GlyphKey::Window),
    kind("AZLogicApp", [0x9E, 0xE0, 0x47], GlyphKey::Sitemap),
    kind("AZAutomationAccount", [0xF4, 0xBA, 0x44], GlyphKey::Cog),
];

const UNKNOWN_NODE_COLOR: Color32 = Color32::from_rgb(0xEE, 0xEE, 0xEE);

const EDGE_KINDS: &[(&str, Color32)] = &[
    ("MemberOf", Color32::from_rgb(0x8A, 0x8F, 0xA3)),
    ("Contains", Color32::from_rgb(0x6E, 0x75, 0x82)),
    ("HasSession", Color32::from_rgb(0xC9, 0xA4, 0x6A)),
    ("AdminTo", Color32::from_rgb(0xE0, 0x68, 0x5F)),
    ("GenericAll", Color32::from_rgb(0xE0, 0x68, 0x5F)),
    ("DCSync", Color32::from_rgb(0xE0, 0x68, 0x5F)),
    ("AZHasRole", Color32::from_rgb(0xED, 0x85, 0x37)),
    ("AZMemberOf", Color32::from_rgb(0x8A, 0x8F, 0xA3)),
];

const DEFAULT_EDGE_COLOR: Color32 = Color32::from_rgb(0xA0, 0xA4, 0xAB);

const LOW_IMPACT_COLOR: Color32 = Color32::from_rgb(0x7A, 0x8C, 0xA8);
const HIGH_IMPACT_COLOR: Color32 = Color32::from_rgb(0xE0, 0x3E, 0x3E);
const MIN_IMPACT_WIDTH: f32 = 1.0;
const MAX_IMPACT_WIDTH: f32 = 4.0;

/// Tag that marks tier-zero assets in `system_tags`.
pub const TIER_ZERO_TAG: &str = "admin_tier_0";

pub const HIGH_VALUE_BORDER: Color32 = Color32::from_rgb(0xF5, 0xCE, 0x5D);

fn lookup(kind: &str) -> Option<&'static KindStyle> {
    NODE_KINDS.iter().find(|style| style.kind == kind)
}

/// First kind with a known style wins, so `["Base", "User"]` styles as a user.
pub fn node_color(kinds: &[String]) -> Color32 {
    kinds
        .iter()
        .find_map(|kind| lookup(kind))
        .map(|style| style.color)
        .unwrap_or(UNKNOWN_NODE_COLOR)
}

pub fn node_glyph(kinds: &[String]) -> Option<GlyphKey> {
    kinds
        .iter()
        .find_map(|kind| lookup(kind))
        .map(|style| style.glyph)
}

pub fn edge_color(kind: &str) -> Color32 {
    EDGE_KINDS
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_EDGE_COLOR)
}

pub fn edge_label(kind: &str, raw_label: Option<&str>) -> String {
    match raw_label.map(str::trim) {
        Some(label) if !label.is_empty() => label.to_owned(),
        _ => kind.to_owned(),
    }
}

/// Edge color for an impact weight in `0..=1`.
pub fn impact_color(weight: f32) -> Color32 {
    let weight = weight.clamp(0.0, 1.0);
    let channel = |low: u8, high: u8| {
        (f32::from(low) + (f32::from(high) - f32::from(low)) * weight).round() as u8
    };
    Color32::from_rgb(
        channel(LOW_IMPACT_COLOR.r(), HIGH_IMPACT_COLOR.r()),
        channel(LOW_IMPACT_COLOR.g(), HIGH_IMPACT_COLOR.g()),
        channel(LOW_IMPACT_COLOR.b(), HIGH_IMPACT_COLOR.b()),
    )
}

/// Width multiplier for an impact weight in `0..=1`.
pub fn impact_width(weight: f32) -> f32 {
    MIN_IMPACT_WIDTH + (MAX_IMPACT_WIDTH - MIN_IMPACT_WIDTH) * weight.clamp(0.0, 1.0)
}

/// Accepts `#RGB`, `#RRGGBB` and `#RRGGBBAA`.
pub fn parse_color(text: &str) -> Option<Color32> {
    let text = text.trim();
    if !text.starts_with('#') {
        return None;
    }
    Color32::from_hex(text).ok()
}

pub fn color_hex(color: Color32) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r(), color.g(), color.b())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn first_known_kind_decides_style() {
        let styled = kinds(&["Base", "Computer"]);
        assert_eq!(node_glyph(&styled), Some(GlyphKey::Desktop));
        assert_eq!(node_color(&styled), Color32::from_rgb(0xE6, 0x78, 0x73));
    }

    #[test]
    fn unknown_kinds_have_no_glyph() {
        let styled = kinds(&["SomethingNew"]);
        assert_eq!(node_glyph(&styled), None);
        assert_eq!(node_color(&styled), UNKNOWN_NODE_COLOR);
    }

    #[test]
    fn hex_colors_round_trip() {
        let color = Color32::from_rgb(0x17, 0xE6, 0x25);
        assert_eq!(color_hex(color), "#17E625");
        assert_eq!(parse_color("#17E625"), Some(color));
        assert_eq!(parse_color("#EEE"), Some(UNKNOWN_NODE_COLOR));
        assert_eq!(parse_color("green"), None);
    }

    #[test]
    fn font_icons_map_to_glyphs() {
        assert_eq!(glyph_for_font_icon("fa-key"), Some(GlyphKey::Key));
        assert_eq!(glyph_for_font_icon("fas fa-box-open"), Some(GlyphKey::Box));
        assert_eq!(glyph_for_font_icon("fa-unheard-of"), None);
        for glyph in GlyphKey::ALL {
            assert_eq!(glyph_for_font_icon(glyph.font_icon()), Some(glyph));
        }
    }

    #[test]
    fn impact_ramps_are_clamped() {
        assert_eq!(impact_color(0.0), LOW_IMPACT_COLOR);
        assert_eq!(impact_color(1.0), HIGH_IMPACT_COLOR);
        assert_eq!(impact_color(7.0), HIGH_IMPACT_COLOR);
        assert_eq!(impact_width(0.0), MIN_IMPACT_WIDTH);
        assert_eq!(impact_width(1.0), MAX_IMPACT_WIDTH);
    }

    #[test]
    fn edge_label_falls_back_to_kind() {
        assert_eq!(edge_label("MemberOf", None), "MemberOf");
        assert_eq!(edge_label("MemberOf", Some("  ")), "MemberOf");
        assert_eq!(edge_label("MemberOf", Some("Member Of")), "Member Of");
    }
}
