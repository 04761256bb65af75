//! The static training-category tree of the German Ausbildungsdiagrammkarte.
//!
//! Built once at first access and shared read-only by every request. The
//! serialized shape (key names, key order, nesting, literal item strings) is
//! frozen: the tablet and web frontends match progress records against it by
//! the (category_key, subcategory_key, item_string) triple, and render
//! categories and sections in the order the wire delivers them. Insertion
//! order is the card's order, so the maps must keep it.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Serialize;

pub type Catalogue = IndexMap<String, Category>;

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub color: String,
    pub sections: IndexMap<String, Section>,
}

/// A section either carries leaf items directly or groups further sections.
/// The data nests groups one level deep at most.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Section {
    Items { name: String, items: Vec<String> },
    Group { name: String, sections: IndexMap<String, Section> },
}

pub fn catalogue() -> &'static Catalogue {
    &CATALOGUE
}

/// Leaf items under one section, descending group nesting.
pub fn section_leaf_count(section: &Section) -> usize {
    match section {
        Section::Items { items, .. } => items.len(),
        Section::Group { sections, .. } => sections.values().map(section_leaf_count).sum(),
    }
}

/// Leaf items under one category.
pub fn category_leaf_count(category: &Category) -> usize {
    category.sections.values().map(section_leaf_count).sum()
}

/// Leaf items across the whole catalogue.
pub fn total_leaf_count(catalogue: &Catalogue) -> usize {
    catalogue.values().map(category_leaf_count).sum()
}

fn items(name: &str, items: &[&str]) -> Section {
    Section::Items {
        name: name.to_string(),
        items: items.iter().map(|s| s.to_string()).collect(),
    }
}

fn group(name: &str, sections: Vec<(&str, Section)>) -> Section {
    Section::Group {
        name: name.to_string(),
        sections: sections
            .into_iter()
            .map(|(key, section)| (key.to_string(), section))
            .collect(),
    }
}

fn single(name: &str) -> Section {
    items(name, &[name])
}

struct CategoryBuilder {
    name: String,
    subtitle: Option<String>,
    color: String,
    sections: Vec<(String, Section)>,
}

impl CategoryBuilder {
    fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            subtitle: None,
            color: color.to_string(),
            sections: Vec::new(),
        }
    }

    fn subtitle(mut self, subtitle: &str) -> Self {
        self.subtitle = Some(subtitle.to_string());
        self
    }

    fn section(mut self, key: &str, section: Section) -> Self {
        self.sections.push((key.to_string(), section));
        self
    }

    fn build(self) -> Category {
        Category {
            name: self.name,
            subtitle: self.subtitle,
            color: self.color,
            sections: self.sections.into_iter().collect(),
        }
    }
}

static CATALOGUE: Lazy<Catalogue> = Lazy::new(build_catalogue);

fn build_catalogue() -> Catalogue {
    let mut catalogue = IndexMap::new();

    catalogue.insert(
        "grundstufe".to_string(),
        CategoryBuilder::new("Grundstufe", "#F59E0B")
            .subtitle("Einweisung und Bedienung")
            .section(
                "besonderheiten_einsteigen",
                single("Besonderheiten beim Einsteigen"),
            )
            .section(
                "einstellen",
                items("Einstellen", &["Sitz", "Spiegel", "Lenkrad", "Kopfstütze"]),
            )
            .section("lenkradhaltung", single("Lenkradhaltung"))
            .section("pedale", single("Pedale"))
            .section("gurt_anlegen", single("Gurt anlegen/anpassen"))
            .section("schalt_wahlhebel", single("Schalt-/Wählhebel"))
            .section("zundschloss", single("Zündschloss"))
            .section("motor_anlassen", single("Motor anlassen"))
            .section("anfahren", single("Anfahren/Anhalteübungen"))
            .section(
                "schaltubungen",
                items(
                    "Schaltübungen (umweltschonend)",
                    &[
                        "hoch: 1-2",
                        "2-3",
                        "3-4",
                        "...",
                        "runter: 4-3",
                        "3-2",
                        "2-1",
                        "...",
                        "runter: 4-2",
                        "4-1",
                        "3-1",
                    ],
                ),
            )
            .section("lenkubungen", single("Lenkübungen"))
            .build(),
    );

    catalogue.insert(
        "aufbaustufe".to_string(),
        CategoryBuilder::new("Aufbaustufe", "#F59E0B")
            .subtitle("Umweltschonendes und vorausschauendes Fahren")
            .section(
                "umweltschonende_fahrweise",
                single("Umweltschonende Fahrweise"),
            )
            .section("rollen_schalten", single("Rollen und Schalten"))
            .section(
                "bremsübungen",
                items(
                    "Bremsübungen",
                    &["degressiv", "Zielbremsung", "Gefahrbremsung"],
                ),
            )
            .section(
                "gefaelle_steigung",
                items(
                    "Gefälle und Steigung",
                    &["Anfahren", "Anhalten", "Rückwärts sichern"],
                ),
            )
            .section("tastgeschwindigkeit", single("Tastgeschwindigkeit"))
            .build(),
    );

    catalogue.insert(
        "leistungsstufe".to_string(),
        CategoryBuilder::new("Leistungsstufe", "#F59E0B")
            .subtitle("Schwierige Verkehrssituationen")
            .section("abbiegen", items("Abbiegen", &["rechts", "links"]))
            .section("vorfahrt", single("Vorfahrt"))
            .section("fahrstreifenwechsel", single("Fahrstreifenwechsel"))
            .section(
                "vorbeifahren_ueberholen",
                items("Vorbeifahren und Überholen", &["Vorbeifahren", "Überholen"]),
            )
            .section(
                "schwierige_verkehrsfuehrung",
                single("Schwierige Verkehrsführung"),
            )
            .build(),
    );

    catalogue.insert(
        "grundfahraufgaben".to_string(),
        CategoryBuilder::new("Grundfahraufgaben", "#EF4444")
            .section(
                "rueckwaerts_kurve",
                single("Rückwärtsfahren um eine Kurve"),
            )
            .section("umkehren", single("Umkehren"))
            .section(
                "einparken",
                items("Einparken", &["längs", "quer"]),
            )
            .section("gefahrbremsung", single("Gefahrbremsung"))
            .build(),
    );

    catalogue.insert(
        "sonderfahrten".to_string(),
        CategoryBuilder::new("Sonderfahrten", "#EF4444")
            .subtitle("Besondere Ausbildungsfahrten")
            .section(
                "ueberlandfahrten",
                items(
                    "Überlandfahrten",
                    &["Fahrbahnrand", "Geschwindigkeit anpassen", "Überholen"],
                ),
            )
            .section(
                "autobahnfahrten",
                items(
                    "Autobahnfahrten",
                    &["Einfahren", "Fahrstreifenwechsel", "Ausfahren"],
                ),
            )
            .section(
                "nachtfahrten",
                items(
                    "Nachtfahrten",
                    &["Beleuchtung", "Blendung", "Parken bei Dunkelheit"],
                ),
            )
            .build(),
    );

    catalogue.insert(
        "situative_bausteine".to_string(),
        CategoryBuilder::new("Situative Bausteine", "#60A5FA")
            .section(
                "fahrtechnische_vorbereitung",
                group(
                    "Checkliste zur fahrtechnischen Vorbereitung",
                    vec![
                        (
                            "fahrzeug",
                            items(
                                "Beim Fahrzeug",
                                &["Reifen (z.B. Beschädigungen, Profiltiefe, Reifendruck)"],
                            ),
                        ),
                        (
                            "scheiben_leuchten",
                            items(
                                "Scheiben, Leuchten, Blinker, Hupe",
                                &["Ein- und Ausschalten"],
                            ),
                        ),
                        (
                            "funktion_prufen",
                            items(
                                "Funktion prüfen",
                                &[
                                    "Standlicht",
                                    "Abblendlicht",
                                    "Fernlicht",
                                    "Schlussleucht m. Kennzeichenbeleuchtung",
                                    "Nebelschlussleuchte",
                                    "Warnblinkanlage",
                                    "Blinker",
                                    "Hupe",
                                    "Bremsleuchte",
                                ],
                            ),
                        ),
                    ],
                ),
            )
            .build(),
    );

    catalogue.insert(
        "fahrerassistenzsysteme".to_string(),
        CategoryBuilder::new("Fahrerassistenzsysteme", "#60A5FA")
            .section(
                "bedienung",
                single("Bedienung der Fahrerassistenzsysteme"),
            )
            .build(),
    );

    catalogue.insert(
        "verkehrswahrnehmung".to_string(),
        CategoryBuilder::new("Verkehrswahrnehmung", "#60A5FA")
            .subtitle("Gefahrenlehre und Blicktechnik")
            .section("blicktechnik", single("Blicktechnik"))
            .section(
                "gefahrenerkennung",
                items(
                    "Gefahrenerkennung",
                    &["Erkennen", "Einschätzen", "Reagieren"],
                ),
            )
            .build(),
    );

    catalogue.insert(
        "geschwindigkeit_abstand".to_string(),
        CategoryBuilder::new("Geschwindigkeit und Abstand", "#60A5FA")
            .section(
                "geschwindigkeit",
                items(
                    "Geschwindigkeit anpassen",
                    &["innerorts", "außerorts"],
                ),
            )
            .section("abstand", single("Abstand halten"))
            .build(),
    );

    catalogue.insert(
        "kreuzungen_einmuendungen".to_string(),
        CategoryBuilder::new("Kreuzungen und Einmündungen", "#8B5CF6")
            .section(
                "heranfahren",
                single("Heranfahren an Kreuzungen"),
            )
            .section(
                "regelungen",
                items(
                    "Regelungen",
                    &["rechts vor links", "Vorfahrtzeichen", "Ampel", "Polizist"],
                ),
            )
            .section("kreisverkehr", single("Kreisverkehr"))
            .build(),
    );

    catalogue.insert(
        "fussgaenger_radfahrer".to_string(),
        CategoryBuilder::new("Fußgänger und Radfahrer", "#8B5CF6")
            .section(
                "fussgaengerueberwege",
                single("Fußgängerüberwege"),
            )
            .section("radwege", single("Radwege und Schutzstreifen"))
            .section(
                "besondere_verkehrsteilnehmer",
                items(
                    "Besondere Verkehrsteilnehmer",
                    &["Kinder", "Ältere Menschen", "Menschen mit Behinderung"],
                ),
            )
            .build(),
    );

    catalogue.insert(
        "bahnuebergaenge".to_string(),
        CategoryBuilder::new("Bahnübergänge", "#8B5CF6")
            .section(
                "verhalten",
                items(
                    "Verhalten am Bahnübergang",
                    &["beschrankt", "unbeschrankt"],
                ),
            )
            .build(),
    );

    catalogue.insert(
        "halten_parken".to_string(),
        CategoryBuilder::new("Halten und Parken", "#EC4899")
            .section("halten", single("Halten"))
            .section(
                "parken",
                items("Parken", &["Parkplatz", "Parkhaus", "am Fahrbahnrand"]),
            )
            .section("sichern", single("Fahrzeug sichern"))
            .build(),
    );

    catalogue.insert(
        "wetter_witterung".to_string(),
        CategoryBuilder::new("Fahren bei Nässe und Glätte", "#EC4899")
            .section(
                "nasse_fahrbahn",
                single("Nasse Fahrbahn"),
            )
            .section(
                "sichtbehinderung",
                items("Sichtbehinderung", &["Regen", "Nebel"]),
            )
            .build(),
    );

    catalogue.insert(
        "umweltbewusstes_fahren".to_string(),
        CategoryBuilder::new("Umweltbewusstes Fahren", "#14B8A6")
            .section(
                "fahrweise",
                items(
                    "Energiesparende Fahrweise",
                    &["Schaltpunkte", "Ausrollen", "Motor-Stopp"],
                ),
            )
            .build(),
    );

    catalogue.insert(
        "reife_teststufe".to_string(),
        CategoryBuilder::new("Reife- und Teststufe", "#10B981")
            .subtitle("Abschluss der Ausbildung - Prüfungsvorbereitung")
            .section(
                "selbststandiges_fahren",
                items("Selbstständiges Fahren", &["innerorts", "außerorts"]),
            )
            .section(
                "verantwortungsbewusstes_fahren",
                single("Verantwortungsbewusstes Fahren"),
            )
            .section(
                "testfahrt",
                items("Testfahrt unter Prüfungsbedingungen", &["FAKT", "andere"]),
            )
            .build(),
    );

    catalogue
}
