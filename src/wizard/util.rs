use log::info;
use regex::Regex;
use rusqlite::Connection;

use std::sync::OnceLock;

use super::data::*;
use crate::internal_error::{InternalError, InternalResult};
use crate::planner::collation::Language;
use crate::planner::data::{DomainFields, DomainIcon, GoalFields, MAX_DOMAINS};
use crate::planner::store::PlannerStore;

struct CategoryPattern {
    category: GoalCategory,
    pattern: &'static str,
}

// Checked in order; the first match wins.
const CATEGORY_PATTERNS: [CategoryPattern; 3] = [
    CategoryPattern {
        category: GoalCategory::Career,
        pattern: r"(?i)\b(carrière|directeur|promotion|poste|emploi|manager|career|director|job)\b",
    },
    CategoryPattern {
        category: GoalCategory::Sport,
        pattern: r"(?i)\b(marathon|courir|sport|compétition|match|course|run|running|race|competition)\b",
    },
    CategoryPattern {
        category: GoalCategory::Business,
        pattern: r"(?i)\b(startup|business|lancer|entreprise|saas|projet|launch|company|project)\b",
    },
];

fn category_regexes() -> &'static [(GoalCategory, Regex)] {
    static REGEXES: OnceLock<Vec<(GoalCategory, Regex)>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        CATEGORY_PATTERNS
            .iter()
            .map(|p| (p.category, Regex::new(p.pattern).expect("valid category regex")))
            .collect()
    })
}

pub fn detect_category(goal: &str) -> GoalCategory {
    category_regexes()
        .iter()
        .find(|(_, regex)| regex.is_match(goal))
        .map(|(category, _)| *category)
        .unwrap_or(GoalCategory::General)
}

pub fn discovery_questions(category: GoalCategory, language: Language) -> [&'static str; 4] {
    match (category, language) {
        (GoalCategory::Career, Language::Fr) => [
            "Quel poste ou niveau visez-vous exactement ?",
            "Quelles sont les 3 compétences clés qui vous manquent pour y arriver ?",
            "Quelle est votre échéance pour atteindre cet objectif ?",
            "Qui sont les personnes clés qui pourraient vous aider ?",
        ],
        (GoalCategory::Career, Language::En) => [
            "What exact position or level are you aiming for?",
            "What are the 3 key skills you are missing to get there?",
            "What is your deadline for reaching this goal?",
            "Who are the key people who could help you?",
        ],
        (GoalCategory::Sport, Language::Fr) => [
            "Quel est votre niveau de performance actuel ?",
            "Quelle est la date de l'événement ou l'échéance de votre objectif ?",
            "Quels sont les principaux obstacles que vous anticipez (physiques, mentaux) ?",
            "Comment prévoyez-vous de suivre vos progrès ?",
        ],
        (GoalCategory::Sport, Language::En) => [
            "What is your current performance level?",
            "When is the event, or the deadline for your goal?",
            "What main obstacles do you expect (physical, mental)?",
            "How do you plan to track your progress?",
        ],
        (GoalCategory::Business, Language::Fr) => [
            "Quel est le problème principal que votre projet résout ?",
            "Qui sont vos clients cibles ?",
            "Quelles sont vos premières sources de financement envisagées ?",
            "Quelle est la plus grande inconnue ou le plus grand risque actuel ?",
        ],
        (GoalCategory::Business, Language::En) => [
            "What main problem does your project solve?",
            "Who are your target customers?",
            "What are your first planned sources of funding?",
            "What is the biggest unknown or risk right now?",
        ],
        (GoalCategory::General, Language::Fr) => [
            "Qu'est-ce qui rend cet objectif si important pour vous personnellement ?",
            "Comment saurez-vous que vous avez réussi ?",
            "Quels sont les premiers petits pas que vous pourriez faire dès cette semaine ?",
            "Qui peut vous soutenir dans cette démarche ?",
        ],
        (GoalCategory::General, Language::En) => [
            "Why does this goal matter so much to you personally?",
            "How will you know you have succeeded?",
            "What small first steps could you take this week?",
            "Who can support you along the way?",
        ],
    }
}

pub fn domain_templates(category: GoalCategory, language: Language) -> [&'static str; MAX_DOMAINS] {
    match (category, language) {
        (GoalCategory::Career, Language::Fr) => [
            "Compétences techniques",
            "Leadership",
            "Réseau professionnel",
            "Formation continue",
            "Visibilité interne",
            "Gestion de projet",
            "Communication",
            "Performance mesurable",
        ],
        (GoalCategory::Career, Language::En) => [
            "Technical skills",
            "Leadership",
            "Professional network",
            "Continuing education",
            "Internal visibility",
            "Project management",
            "Communication",
            "Measurable performance",
        ],
        (GoalCategory::Sport, Language::Fr) => [
            "Technique de base",
            "Endurance",
            "Force/vitesse",
            "Nutrition",
            "Récupération",
            "Mental",
            "Équipement",
            "Planification d'entraînement",
        ],
        (GoalCategory::Sport, Language::En) => [
            "Core technique",
            "Endurance",
            "Strength/speed",
            "Nutrition",
            "Recovery",
            "Mindset",
            "Equipment",
            "Training plan",
        ],
        (GoalCategory::Business, Language::Fr) => [
            "Produit/Service",
            "Marché/clients",
            "Financement",
            "Équipe",
            "Marketing",
            "Légal/admin",
            "Technologie",
            "Réseau/partenaires",
        ],
        (GoalCategory::Business, Language::En) => [
            "Product/Service",
            "Market/customers",
            "Funding",
            "Team",
            "Marketing",
            "Legal/admin",
            "Technology",
            "Network/partners",
        ],
        (GoalCategory::General, Language::Fr) => [
            "Développement personnel",
            "Santé & Bien-être",
            "Relations sociales",
            "Finances personnelles",
            "Environnement",
            "Contribution",
            "Loisirs & Passions",
            "Apprentissage continu",
        ],
        (GoalCategory::General, Language::En) => [
            "Personal growth",
            "Health & Well-being",
            "Social relationships",
            "Personal finances",
            "Environment",
            "Contribution",
            "Hobbies & Passions",
            "Lifelong learning",
        ],
    }
}

pub fn suggest_setup(goal: &str, language: Language) -> SetupSuggestion {
    let category = detect_category(goal);

    SetupSuggestion {
        category,
        questions: discovery_questions(category, language).to_vec(),
        domains: domain_templates(category, language).to_vec(),
    }
}

fn not_applicable(language: Language) -> &'static str {
    match language {
        Language::Fr => "Non applicable",
        Language::En => "N/A",
    }
}

fn default_domain_description(language: Language) -> &'static str {
    match language {
        Language::Fr => "Ajoutez une description pour ce domaine afin de clarifier son périmètre et ses objectifs.",
        Language::En => "Add a description to this domain to clarify its scope and objectives.",
    }
}

/// Folds the discovery answers into the goal description.
pub fn build_description(answers: &[DiscoveryAnswer], language: Language) -> String {
    answers
        .iter()
        .map(|entry| {
            let answer = entry.answer.trim();
            let answer = if answer.is_empty() {
                not_applicable(language)
            } else {
                answer
            };
            format!("Q: {}\nA: {}", entry.question, answer)
        })
        .collect::<Vec<String>>()
        .join("\n\n")
}

/// Creates the goal and its domains in one transaction.
pub fn setup_goal(
    db_connection: &Connection,
    user: &str,
    request: &SetupRequest,
    language: Language,
) -> InternalResult<SetupResult> {
    let titles: Vec<&str> = request.domains.iter().map(|title| title.trim()).collect();
    if titles.is_empty() || titles.len() > MAX_DOMAINS {
        return Err(InternalError::InvalidInput(format!(
            "a goal needs between 1 and {} domains",
            MAX_DOMAINS
        )));
    }
    if titles.iter().any(|title| title.is_empty()) {
        return Err(InternalError::InvalidInput(
            "domain titles must not be empty".to_string(),
        ));
    }

    let transaction = db_connection.unchecked_transaction()?;

    let goal = db_connection.add_goal(
        user,
        &GoalFields {
            title: request.title.clone(),
            description: build_description(&request.answers, language),
        },
    )?;

    let mut domains = Vec::with_capacity(titles.len());
    for (index, title) in titles.iter().enumerate() {
        domains.push(db_connection.add_domain(
            user,
            &DomainFields {
                title: title.to_string(),
                description: Some(default_domain_description(language).to_string()),
                is_priority: false,
                icon: DomainIcon::for_index(index),
            },
        )?);
    }

    transaction.commit()?;
    info!(
        "User {} set up goal {} with {} domains",
        user,
        goal.id,
        domains.len()
    );

    Ok(SetupResult { goal, domains })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::open_database;

    #[test]
    fn test_detect_category() {
        assert_eq!(detect_category("Devenir directeur commercial"), GoalCategory::Career);
        assert_eq!(detect_category("Courir un MARATHON en 2025"), GoalCategory::Sport);
        assert_eq!(detect_category("Lancer mon SaaS"), GoalCategory::Business);
        assert_eq!(detect_category("Get a promotion at work"), GoalCategory::Career);
        assert_eq!(detect_category("Apprendre le piano"), GoalCategory::General);
    }

    #[test]
    fn test_detect_category_whole_words_only() {
        // "jobless" and "marathons" are not the listed keywords.
        assert_eq!(detect_category("jobless marathons"), GoalCategory::General);
        assert_eq!(detect_category("Obtenir une promotion"), GoalCategory::Career);
    }

    #[test]
    fn test_career_checked_before_business() {
        assert_eq!(
            detect_category("Manager une entreprise"),
            GoalCategory::Career
        );
    }

    #[test]
    fn test_suggestion_has_full_templates() {
        let suggestion = suggest_setup("Run a marathon", Language::En);
        assert_eq!(suggestion.category, GoalCategory::Sport);
        assert_eq!(suggestion.questions.len(), 4);
        assert_eq!(suggestion.domains.len(), MAX_DOMAINS);
        assert_eq!(suggestion.domains[1], "Endurance");
    }

    #[test]
    fn test_build_description() {
        let answers = vec![
            DiscoveryAnswer {
                question: "Pourquoi ?".to_string(),
                answer: "Pour ma santé".to_string(),
            },
            DiscoveryAnswer {
                question: "Quand ?".to_string(),
                answer: "  ".to_string(),
            },
        ];
        assert_eq!(
            build_description(&answers, Language::Fr),
            "Q: Pourquoi ?\nA: Pour ma santé\n\nQ: Quand ?\nA: Non applicable"
        );
        assert_eq!(build_description(&[], Language::En), "");
    }

    #[test]
    fn test_setup_goal_creates_domains() {
        let db_connection = open_database(":memory:").unwrap();
        let request = SetupRequest {
            title: "Lancer ma startup".to_string(),
            answers: vec![],
            domains: domain_templates(GoalCategory::Business, Language::Fr)
                .iter()
                .map(|title| title.to_string())
                .collect(),
        };

        let result = setup_goal(&db_connection, "alice", &request, Language::Fr).unwrap();
        assert_eq!(result.domains.len(), 8);
        assert_eq!(result.domains[0].icon, DomainIcon::Users);
        assert_eq!(result.domains[7].icon, DomainIcon::ShieldCheck);
        assert_eq!(db_connection.domains("alice").unwrap(), result.domains);
        assert_eq!(
            db_connection.active_goal("alice").unwrap(),
            Some(result.goal)
        );
    }

    #[test]
    fn test_setup_goal_is_all_or_nothing() {
        let db_connection = open_database(":memory:").unwrap();
        let too_many = SetupRequest {
            title: "Goal".to_string(),
            answers: vec![],
            domains: (0..9).map(|i| format!("Domain {}", i)).collect(),
        };
        assert!(matches!(
            setup_goal(&db_connection, "alice", &too_many, Language::En),
            Err(InternalError::InvalidInput(_))
        ));

        let blank_title = SetupRequest {
            title: " ".to_string(),
            answers: vec![],
            domains: vec!["Health".to_string()],
        };
        assert!(setup_goal(&db_connection, "alice", &blank_title, Language::En).is_err());
        assert!(db_connection.active_goal("alice").unwrap().is_none());
        assert!(db_connection.domains("alice").unwrap().is_empty());
    }
}
