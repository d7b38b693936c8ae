//! TOML configuration for one planning run.
//!
//! Loads the people, duty catalog, rule network, and wish registry the
//! teacher's `Config`/`load_config` used to load a flatter "places and
//! groups" model for; here the same load-then-assemble shape carries the
//! richer entity set this spec's engine needs. Unknown entity references
//! are rejected at assembly time (spec.md §7's `InvalidInput`), not left to
//! surface as silent no-op rules later.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{NaiveDate, Weekday};
use serde::Deserialize;

use crate::error::{Result, RosterError};
use crate::model::duty::{DutyCatalog, DutyForm, DutyGroup};
use crate::model::entity::{DutyFormId, DutyGroupId, PersonId, RotationTemplateId};
use crate::model::person::{Person, PersonRegistry, RotationConcrete};
use crate::model::plan::PlanState;
use crate::model::wish::WishRegistry;
use crate::rules::{Effect, Rule, RuleNetwork, Subject, Weight};

/// configuration root, as read straight off disk
#[derive(Debug, Deserialize)]
pub struct Config {
    pub dates: DatesConfig,
    #[serde(default)]
    pub people: Vec<PersonConfig>,
    #[serde(default)]
    pub duty_groups: Vec<DutyGroupConfig>,
    #[serde(default)]
    pub duties: Vec<DutyConfig>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub wishes: Vec<WishConfig>,
    #[serde(default)]
    pub free_wishes: Vec<FreeWishConfig>,
    /// spec.md §3/§6's optional `seed-plan` input
    #[serde(default)]
    pub seed_plan: Vec<SeedEntryConfig>,
}

/// first day of the horizon and its length in days (spec.md §6's
/// `start-date, horizon-days`)
#[derive(Debug, Deserialize)]
pub struct DatesConfig {
    pub start: NaiveDate,
    pub horizon_days: u32,
}

#[derive(Debug, Deserialize)]
pub struct PersonConfig {
    pub id: String,
    pub work_capacity: f64,
    #[serde(default = "default_true")]
    pub duty_fit: bool,
    #[serde(default)]
    pub absences: Vec<NaiveDate>,
    #[serde(default)]
    pub rotations: Vec<RotationConfig>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct RotationConfig {
    pub template: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct DutyGroupConfig {
    pub id: String,
    #[serde(default)]
    pub applies_on_holidays: bool,
}

#[derive(Debug, Deserialize)]
pub struct DutyConfig {
    pub id: String,
    pub weekday: Weekday,
    pub group: String,
    #[serde(default)]
    pub follow_up_free: bool,
    pub max_in_a_row: u32,
    pub max_per_month: u32,
    pub weight: f64,
    #[serde(default)]
    pub linked_forms: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleWeightConfig {
    Must,
    Should,
    May,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleEffectConfig {
    Combination,
    Forbidden,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleSubjectConfig {
    DutyDuty { a: String, b: String },
    PersonPerson { a: String, b: String },
    PersonDuty { person: String, duty: String },
    /// rotation <-> duty, spec.md §3's `subtype = Combination`
    Combination { rotation: String, duty: String },
}

#[derive(Debug, Deserialize)]
pub struct RuleConfig {
    pub id: u64,
    pub weight: RuleWeightConfig,
    pub effect: RuleEffectConfig,
    pub subject: RuleSubjectConfig,
}

#[derive(Debug, Deserialize)]
pub struct WishConfig {
    pub person: String,
    pub date: NaiveDate,
    pub duty: String,
}

#[derive(Debug, Deserialize)]
pub struct FreeWishConfig {
    pub person: String,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct SeedEntryConfig {
    pub date: NaiveDate,
    pub duty: String,
    pub person: String,
}

/// read and parse the config file; does not yet validate cross-references
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let content = fs::read_to_string(path.as_ref())
        .map_err(|e| RosterError::Config(format!("{}: {e}", path.as_ref().display())))?;
    toml::from_str(&content).map_err(|e| RosterError::Config(e.to_string()))
}

/// everything the scheduler needs for one planning run, assembled from a
/// validated [`Config`] (spec.md §6's programmatic inputs)
pub struct Assembled {
    pub people: PersonRegistry,
    pub catalog: DutyCatalog,
    pub network: RuleNetwork,
    pub wishes: WishRegistry,
    pub start: NaiveDate,
    pub horizon_days: u32,
    pub seed: PlanState,
}

impl Config {
    /// validates cross-references and builds the in-memory model. Fatal on
    /// any unknown entity reference or malformed duty metadata (spec.md §7's
    /// `InvalidInput`, setup-time only).
    pub fn assemble(self) -> Result<Assembled> {
        let groups: Vec<DutyGroup> = self
            .duty_groups
            .iter()
            .map(|g| DutyGroup {
                id: DutyGroupId::new(g.id.clone()),
                applies_on_holidays: g.applies_on_holidays,
            })
            .collect();

        let forms: Vec<DutyForm> = self
            .duties
            .iter()
            .map(|d| DutyForm {
                id: DutyFormId::new(d.id.clone()),
                applicable_weekday: d.weekday,
                group: DutyGroupId::new(d.group.clone()),
                follow_up_free: d.follow_up_free,
                max_in_a_row: d.max_in_a_row,
                max_per_month: d.max_per_month,
                weight: d.weight,
                linked_forms: d.linked_forms.iter().cloned().map(DutyFormId::new).collect(),
            })
            .collect();

        let catalog = DutyCatalog::build(forms, groups)?;
        for d in &self.duties {
            for linked in &d.linked_forms {
                require_duty(&catalog, linked)?;
            }
        }

        let mut people = Vec::with_capacity(self.people.len());
        for p in &self.people {
            if !(0.0 < p.work_capacity && p.work_capacity <= 1.0) {
                return Err(RosterError::InvalidWorkCapacity {
                    person: p.id.clone(),
                    value: p.work_capacity,
                });
            }
            let mut person = Person::new(p.id.clone(), p.work_capacity);
            person.duty_fit = p.duty_fit;
            person.absences = p.absences.iter().copied().collect();
            person.rotations = p
                .rotations
                .iter()
                .map(|r| RotationConcrete {
                    active_interval: (r.from, r.to),
                    rotation_template: RotationTemplateId::new(r.template.clone()),
                })
                .collect();
            people.push(person);
        }
        let people = PersonRegistry::new(people);

        let mut network = RuleNetwork::new();
        for r in &self.rules {
            let subject = match &r.subject {
                RuleSubjectConfig::DutyDuty { a, b } => {
                    require_duty(&catalog, a)?;
                    require_duty(&catalog, b)?;
                    Subject::DutyDuty(DutyFormId::new(a.clone()), DutyFormId::new(b.clone()))
                }
                RuleSubjectConfig::PersonPerson { a, b } => {
                    require_person(&people, a)?;
                    require_person(&people, b)?;
                    Subject::PersonPerson(PersonId::new(a.clone()), PersonId::new(b.clone()))
                }
                RuleSubjectConfig::PersonDuty { person, duty } => {
                    require_person(&people, person)?;
                    require_duty(&catalog, duty)?;
                    Subject::PersonDuty(PersonId::new(person.clone()), DutyFormId::new(duty.clone()))
                }
                RuleSubjectConfig::Combination { rotation, duty } => {
                    require_duty(&catalog, duty)?;
                    Subject::Combination(RotationTemplateId::new(rotation.clone()), DutyFormId::new(duty.clone()))
                }
            };
            network.register(Rule {
                id: crate::model::entity::RuleId(r.id),
                weight: match r.weight {
                    RuleWeightConfig::Must => Weight::Must,
                    RuleWeightConfig::Should => Weight::Should,
                    RuleWeightConfig::May => Weight::May,
                },
                effect: match r.effect {
                    RuleEffectConfig::Combination => Effect::Combination,
                    RuleEffectConfig::Forbidden => Effect::Forbidden,
                },
                subject,
            });
        }

        let mut wishes = WishRegistry::new();
        for w in &self.wishes {
            require_person(&people, &w.person)?;
            require_duty(&catalog, &w.duty)?;
            wishes.add_wish(PersonId::new(w.person.clone()), w.date, DutyFormId::new(w.duty.clone()));
        }
        for fw in &self.free_wishes {
            require_person(&people, &fw.person)?;
            wishes.add_free_wish(PersonId::new(fw.person.clone()), fw.date);
        }

        let mut seed_by_day: BTreeMap<NaiveDate, BTreeMap<DutyFormId, PersonId>> = BTreeMap::new();
        for entry in &self.seed_plan {
            require_person(&people, &entry.person)?;
            require_duty(&catalog, &entry.duty)?;
            seed_by_day
                .entry(entry.date)
                .or_default()
                .insert(DutyFormId::new(entry.duty.clone()), PersonId::new(entry.person.clone()));
        }
        let mut seed = PlanState::new();
        seed.seed(seed_by_day);

        Ok(Assembled {
            people,
            catalog,
            network,
            wishes,
            start: self.dates.start,
            horizon_days: self.dates.horizon_days,
            seed,
        })
    }
}

fn require_duty(catalog: &DutyCatalog, id: &str) -> Result<()> {
    if catalog.duty(&DutyFormId::new(id)).is_none() {
        return Err(RosterError::UnknownEntity {
            rule: "duty reference".to_string(),
            entity: id.to_string(),
        });
    }
    Ok(())
}

fn require_person(people: &PersonRegistry, id: &str) -> Result<()> {
    if people.get(&PersonId::new(id)).is_none() {
        return Err(RosterError::UnknownEntity {
            rule: "person reference".to_string(),
            entity: id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[dates]
start = 2025-09-01
horizon_days = 7

[[people]]
id = "alice"
work_capacity = 1.0

[[people]]
id = "bob"
work_capacity = 0.5

[[duty_groups]]
id = "weekday"
applies_on_holidays = false

[[duties]]
id = "friday-night"
weekday = "Fri"
group = "weekday"
follow_up_free = true
max_in_a_row = 2
max_per_month = 10
weight = 1.0

[[duties]]
id = "saturday-day"
weekday = "Sat"
group = "weekday"
max_in_a_row = 2
max_per_month = 10
weight = 1.0

[[rules]]
id = 1
weight = "must"
effect = "forbidden"
subject = { kind = "person_person", a = "alice", b = "bob" }

[[wishes]]
person = "alice"
date = 2025-09-05
duty = "friday-night"

[[free_wishes]]
person = "bob"
date = 2025-09-06
"#;

    #[test]
    fn parses_and_assembles_sample_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let assembled = config.assemble().unwrap();

        assert_eq!(assembled.people.len(), 2);
        assert!(assembled.catalog.duty(&DutyFormId::new("friday-night")).is_some());
        assert!(assembled.wishes.is_requested(
            NaiveDate::from_ymd_opt(2025, 9, 5).unwrap(),
            &DutyFormId::new("friday-night")
        ));
        assert!(assembled
            .wishes
            .has_free_wish(&PersonId::new("bob"), NaiveDate::from_ymd_opt(2025, 9, 6).unwrap()));
    }

    #[test]
    fn rejects_out_of_range_work_capacity() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.people[0].work_capacity = 0.0;
        let err = config.assemble().unwrap_err();
        assert!(matches!(err, RosterError::InvalidWorkCapacity { .. }));
    }

    #[test]
    fn rejects_rule_referencing_unknown_person() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.rules[0].subject = RuleSubjectConfig::PersonPerson {
            a: "alice".to_string(),
            b: "ghost".to_string(),
        };
        let err = config.assemble().unwrap_err();
        assert!(matches!(err, RosterError::UnknownEntity { .. }));
    }

    #[test]
    fn rejects_unknown_duty_in_wish() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.wishes[0].duty = "no-such-duty".to_string();
        let err = config.assemble().unwrap_err();
        assert!(matches!(err, RosterError::UnknownEntity { .. }));
    }

    #[test]
    fn load_config_reads_a_real_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = load_config(&path).expect("config.toml should load");
        let assembled = config.assemble().unwrap();
        assert_eq!(assembled.people.len(), 2);
    }

    #[test]
    fn load_config_reports_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_config(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, RosterError::Config(_)));
    }
}
