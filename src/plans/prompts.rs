//! Prompt builders for every generation feature. All prompts ask for
//! European Portuguese output; the API wire stays English.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::plans::types::{
    ActivityLevel, Biometrics, DietaryPreference, Goal, NutritionPlan, Sex, Weekday, WeeklyPlan,
};

fn sex_label(sex: Sex) -> &'static str {
    match sex {
        Sex::Male => "Masculino",
        Sex::Female => "Feminino",
    }
}

fn activity_label(level: ActivityLevel) -> &'static str {
    match level {
        ActivityLevel::Sedentary => "Sedentário (pouco ou nenhum exercício)",
        ActivityLevel::Light => "Levemente Ativo (exercício leve 1-3 dias/semana)",
        ActivityLevel::Moderate => "Moderadamente Ativo (exercício moderado 3-5 dias/semana)",
        ActivityLevel::Active => "Muito Ativo (exercício intenso 6-7 dias/semana)",
        ActivityLevel::VeryActive => "Extremamente Ativo (trabalho físico + exercício intenso)",
    }
}

/// Verb form used when describing what the plan should achieve.
fn goal_label(goal: Goal) -> &'static str {
    match goal {
        Goal::LoseWeight => "perder peso",
        Goal::MaintainWeight => "manter o peso",
        Goal::GainMuscle => "ganhar massa muscular",
    }
}

/// Noun form used in the assistant's profile summary.
fn goal_noun_label(goal: Goal) -> &'static str {
    match goal {
        Goal::LoseWeight => "perda de peso",
        Goal::MaintainWeight => "manutenção de peso",
        Goal::GainMuscle => "ganho de massa muscular",
    }
}

fn dietary_label(pref: DietaryPreference) -> &'static str {
    match pref {
        DietaryPreference::None => "Nenhuma",
        other => other.as_str(),
    }
}

/// Prompt for one day's plan. `weekly_context` threads variety hints
/// between consecutive days of a weekly generation.
pub fn daily_plan(bio: &Biometrics, weekly_context: Option<&str>) -> String {
    let base = format!(
        "Crie um plano nutricional detalhado para um dia, em português de Portugal, \
para uma pessoa com as seguintes características:\n\
- Idade: {age}\n\
- Sexo: {sex}\n\
- Peso: {weight} kg\n\
- Altura: {height} cm\n\
- Nível de Atividade: {activity}\n\
- Objetivo: {goal}\n\
- Preferência Alimentar: {pref}\n\n\
O plano deve incluir o total de calorias e a distribuição de macronutrientes \
(proteínas, hidratos de carbono, gorduras).\n\
Deve detalhar 4 refeições: pequeno-almoço, almoço, jantar e snacks.\n\
Para cada refeição, forneça o nome do prato, uma breve descrição, e a estimativa \
de calorias, proteínas, hidratos de carbono e gorduras.",
        age = bio.age,
        sex = sex_label(bio.sex),
        weight = bio.weight,
        height = bio.height,
        activity = activity_label(bio.activity_level),
        goal = goal_label(bio.goal),
        pref = dietary_label(bio.dietary_preference),
    );

    let closing = "Responda apenas com o objeto JSON formatado de acordo com o schema fornecido.";
    match weekly_context {
        Some(context) => format!("{base}\n\nContexto semanal: {context}\n\n{closing}"),
        None => format!("{base}\n\n{closing}"),
    }
}

/// Variety context for the first day of a weekly generation.
pub fn first_day_context() -> String {
    "Este é o primeiro dia do plano semanal. Cria um plano inicial variado.".to_string()
}

/// Variety context derived from the day just generated.
pub fn next_day_context(previous: &NutritionPlan) -> String {
    format!(
        "As refeições do dia anterior foram: {}. Para o dia seguinte, cria um plano \
com refeições diferentes para garantir variedade.",
        previous.meal_names().join(", ")
    )
}

#[derive(Serialize)]
struct DaySummary<'a> {
    breakfast: &'a str,
    lunch: &'a str,
    dinner: &'a str,
    snacks: &'a str,
}

/// Prompt asking for an aggregated shopping list. Only meal descriptions
/// are sent, keyed by weekday, to keep the request small.
pub fn shopping_list(week: &WeeklyPlan) -> String {
    let summary: BTreeMap<Weekday, DaySummary> = week
        .iter()
        .map(|(day, plan)| {
            (
                *day,
                DaySummary {
                    breakfast: &plan.meals.breakfast.description,
                    lunch: &plan.meals.lunch.description,
                    dinner: &plan.meals.dinner.description,
                    snacks: &plan.meals.snacks.description,
                },
            )
        })
        .collect();
    let summary_json = serde_json::to_string(&summary).unwrap_or_default();

    format!(
        "Com base no seguinte resumo de um plano nutricional semanal, crie uma lista \
de compras agregada e organizada por categorias. Some as quantidades de ingredientes \
idênticos necessários para toda a semana. Comunique em português de Portugal.\n\n\
Plano Semanal (resumo):\n{summary_json}\n\n\
Categorias sugeridas: Frutas e Legumes, Carne e Peixe, Laticínios e Ovos, Padaria e \
Cereais, Despensa (ex: enlatados, azeite, especiarias), Outros.\n\
Para cada item, forneça o nome, a quantidade total para a semana (com unidade), a \
categoria e o estado 'completed' como 'false'.\n\
Responda apenas com o array de objetos JSON."
    )
}

/// Prompt sent alongside one or more meal photos.
pub fn meal_analysis() -> String {
    "Analise a(s) imagem(s) de refeição fornecida(s). Para cada imagem, identifique a \
refeição, forneça uma breve descrição dos alimentos visíveis, e faça uma estimativa \
das calorias totais e da distribuição de macronutrientes (proteínas, hidratos de \
carbono, gorduras) em gramas. Comunique em português de Portugal. Retorne uma lista \
de objetos JSON, um para cada imagem. Se houver apenas uma imagem, retorne uma lista \
com um único objeto."
        .to_string()
}

/// System instruction for the chat assistant, personalized with the user's
/// profile and their current plan when one exists.
pub fn chat_system_instruction(
    name: &str,
    bio: &Biometrics,
    plan: Option<&NutritionPlan>,
) -> String {
    let plan_block = match plan {
        Some(plan) => format!(
            "Este é o plano nutricional diário atual do utilizador:\n{}",
            serde_json::to_string_pretty(plan).unwrap_or_default()
        ),
        None => "O utilizador ainda não gerou um plano nutricional.".to_string(),
    };

    format!(
        "És um assistente de nutrição simpático e prestável chamado NutriAI.\n\
O teu objetivo é ajudar o utilizador a seguir o seu plano, responder a perguntas \
sobre nutrição e dar sugestões.\n\
Comunica em português de Portugal. As tuas respostas devem ser concisas e fáceis de entender.\n\n\
Este é o perfil do utilizador atual:\n\
- Nome: {name}\n\
- Idade: {age}\n\
- Sexo: {sex}\n\
- Peso: {weight} kg\n\
- Altura: {height} cm\n\
- Objetivo: {goal}\n\n\
{plan_block}\n\n\
Usa esta informação para dar respostas personalizadas e contextuais.\n\
Se o utilizador pedir para alterar o plano, explica que não podes alterar o plano \
principal, mas podes dar sugestões de substituições ou alternativas para refeições \
específicas.\n\
Começa a conversa com uma saudação amigável.",
        age = bio.age,
        sex = sex_label(bio.sex),
        weight = bio.weight,
        height = bio.height,
        goal = goal_noun_label(bio.goal),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::types::test_support::sample_plan;

    fn bio() -> Biometrics {
        Biometrics {
            age: 28,
            sex: Sex::Female,
            weight: 62.5,
            height: 168.0,
            activity_level: ActivityLevel::Active,
            goal: Goal::LoseWeight,
            dietary_preference: DietaryPreference::Vegetarian,
        }
    }

    #[test]
    fn daily_prompt_describes_the_profile_in_portuguese() {
        let prompt = daily_plan(&bio(), None);
        assert!(prompt.contains("- Idade: 28"));
        assert!(prompt.contains("- Sexo: Feminino"));
        assert!(prompt.contains("- Peso: 62.5 kg"));
        assert!(prompt.contains("- Objetivo: perder peso"));
        assert!(prompt.contains("- Preferência Alimentar: vegetarian"));
        assert!(prompt.contains("pequeno-almoço, almoço, jantar e snacks"));
        assert!(!prompt.contains("Contexto semanal"));
    }

    #[test]
    fn daily_prompt_threads_weekly_context() {
        let context = first_day_context();
        let prompt = daily_plan(&bio(), Some(&context));
        assert!(prompt.contains("Contexto semanal: Este é o primeiro dia do plano semanal."));
    }

    #[test]
    fn next_day_context_lists_previous_meal_names() {
        let context = next_day_context(&sample_plan("seg"));
        assert!(context.contains("Aveia seg, Frango seg, Salmão seg, Iogurte seg"));
        assert!(context.contains("refeições diferentes para garantir variedade"));
    }

    #[test]
    fn no_dietary_preference_reads_nenhuma() {
        let mut bio = bio();
        bio.dietary_preference = DietaryPreference::None;
        assert!(daily_plan(&bio, None).contains("- Preferência Alimentar: Nenhuma"));
    }

    #[test]
    fn shopping_prompt_summarizes_descriptions_by_day() {
        let mut week = WeeklyPlan::new();
        week.insert(Weekday::Tuesday, sample_plan("ter"));
        week.insert(Weekday::Monday, sample_plan("seg"));

        let prompt = shopping_list(&week);
        assert!(prompt.contains("Descrição de Aveia"));
        assert!(prompt.contains("Frutas e Legumes, Carne e Peixe"));
        // Days appear Monday first regardless of insertion order.
        let monday = prompt.find("\"monday\"").unwrap();
        let tuesday = prompt.find("\"tuesday\"").unwrap();
        assert!(monday < tuesday);
        // Meal names are dropped from the summary.
        assert!(!prompt.contains("Aveia seg"));
    }

    #[test]
    fn chat_instruction_includes_profile_and_plan() {
        let plan = sample_plan("x");
        let prompt = chat_system_instruction("Maria", &bio(), Some(&plan));
        assert!(prompt.contains("chamado NutriAI"));
        assert!(prompt.contains("- Nome: Maria"));
        assert!(prompt.contains("- Objetivo: perda de peso"));
        assert!(prompt.contains("plano nutricional diário atual"));
        assert!(prompt.contains("Aveia x"));
        assert!(prompt.contains("saudação amigável"));
    }

    #[test]
    fn chat_instruction_without_plan() {
        let prompt = chat_system_instruction("Rui", &bio(), None);
        assert!(prompt.contains("O utilizador ainda não gerou um plano nutricional."));
    }
}
