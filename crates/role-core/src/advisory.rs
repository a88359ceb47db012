//! Advisory Tools
//!
//! Investment-advice tools layered on the role engine. Each one checks its
//! enum-constrained arguments, renders a fixed analysis prompt and sends it
//! through [`RoleEngine::generate`], so the current role's system prompt and
//! user template apply. History is never touched.
//!
//! | Tool                   | Required arguments                                         |
//! |------------------------|------------------------------------------------------------|
//! | `analyze_investment`   | investment_type, amount, time_horizon, risk_tolerance     |
//! | `portfolio_review`     | portfolio_holdings, total_value, goals                     |
//! | `market_analysis`      | market_sector, analysis_type                               |
//! | `financial_planning`   | age, income, goals                                         |
//! | `investment_education` | topic                                                      |

use serde::Deserialize;

use crate::engine::{GenerationRequest, RoleEngine};
use crate::error::Result;
use crate::tool::{ParameterSchema, ToolCall, ToolOutput, ToolSchema};

macro_rules! choice {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const VALUES: &'static [&'static str] = &[$($label),+];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice!(
    /// Asset class under analysis
    InvestmentType {
        Stocks => "stocks",
        Bonds => "bonds",
        RealEstate => "real_estate",
        Crypto => "crypto",
        Commodities => "commodities",
        Etfs => "etfs",
        MutualFunds => "mutual_funds",
    }
);

choice!(
    TimeHorizon {
        ShortTerm => "short_term",
        MediumTerm => "medium_term",
        LongTerm => "long_term",
    }
);

choice!(
    RiskTolerance {
        Conservative => "conservative",
        Moderate => "moderate",
        Aggressive => "aggressive",
    }
);

choice!(
    MarketSector {
        Technology => "technology",
        Healthcare => "healthcare",
        Finance => "finance",
        Energy => "energy",
        Consumer => "consumer",
        RealEstate => "real_estate",
        General => "general",
    }
);

choice!(
    AnalysisType {
        Trends => "trends",
        Risks => "risks",
        Opportunities => "opportunities",
        Outlook => "outlook",
        Comprehensive => "comprehensive",
    }
);

choice!(
    EducationTopic {
        Basics => "basics",
        Diversification => "diversification",
        RiskManagement => "risk_management",
        AssetAllocation => "asset_allocation",
        TaxEfficiency => "tax_efficiency",
        RetirementPlanning => "retirement_planning",
    }
);

choice!(
    Complexity {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
);

/// The advisory tool family
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvisoryTool {
    AnalyzeInvestment,
    PortfolioReview,
    MarketAnalysis,
    FinancialPlanning,
    InvestmentEducation,
}

impl AdvisoryTool {
    pub const ALL: [Self; 5] = [
        Self::AnalyzeInvestment,
        Self::PortfolioReview,
        Self::MarketAnalysis,
        Self::FinancialPlanning,
        Self::InvestmentEducation,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::AnalyzeInvestment => "analyze_investment",
            Self::PortfolioReview => "portfolio_review",
            Self::MarketAnalysis => "market_analysis",
            Self::FinancialPlanning => "financial_planning",
            Self::InvestmentEducation => "investment_education",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn schema(self) -> ToolSchema {
        let (description, parameters) = match self {
            Self::AnalyzeInvestment => (
                "Analyze an investment opportunity or strategy",
                vec![
                    ParameterSchema::new("investment_type", "string", "Asset class", true)
                        .with_enum(InvestmentType::VALUES),
                    ParameterSchema::new("amount", "number", "Amount to invest in USD", true),
                    ParameterSchema::new("time_horizon", "string", "Holding period", true)
                        .with_enum(TimeHorizon::VALUES),
                    ParameterSchema::new("risk_tolerance", "string", "Investor risk tolerance", true)
                        .with_enum(RiskTolerance::VALUES),
                    ParameterSchema::new("additional_context", "string", "Anything else relevant", false),
                ],
            ),
            Self::PortfolioReview => (
                "Review and analyze an investment portfolio",
                vec![
                    ParameterSchema::new("portfolio_holdings", "string", "Holdings and their weights", true),
                    ParameterSchema::new("total_value", "number", "Total portfolio value in USD", true),
                    ParameterSchema::new("goals", "string", "Investment goals", true),
                    ParameterSchema::new("time_horizon", "string", "Holding period", false)
                        .with_default(serde_json::json!(TimeHorizon::LongTerm.as_str())),
                ],
            ),
            Self::MarketAnalysis => (
                "Provide market analysis and economic insights",
                vec![
                    ParameterSchema::new("market_sector", "string", "Sector to analyze", true)
                        .with_enum(MarketSector::VALUES),
                    ParameterSchema::new("analysis_type", "string", "Focus of the analysis", true)
                        .with_enum(AnalysisType::VALUES),
                    ParameterSchema::new("timeframe", "string", "Outlook timeframe", false)
                        .with_enum(TimeHorizon::VALUES)
                        .with_default(serde_json::json!(TimeHorizon::MediumTerm.as_str())),
                ],
            ),
            Self::FinancialPlanning => (
                "Provide financial planning advice",
                vec![
                    ParameterSchema::new("age", "integer", "Age in years", true),
                    ParameterSchema::new("income", "number", "Annual income in USD", true),
                    ParameterSchema::new("goals", "string", "Financial goals", true),
                    ParameterSchema::new("savings", "number", "Current savings in USD", false)
                        .with_default(serde_json::json!(0)),
                    ParameterSchema::new("debt", "number", "Current debt in USD", false)
                        .with_default(serde_json::json!(0)),
                ],
            ),
            Self::InvestmentEducation => (
                "Provide educational content about investing",
                vec![
                    ParameterSchema::new("topic", "string", "Subject to explain", true)
                        .with_enum(EducationTopic::VALUES),
                    ParameterSchema::new("complexity", "string", "Depth of the explanation", false)
                        .with_enum(Complexity::VALUES)
                        .with_default(serde_json::json!(Complexity::Intermediate.as_str())),
                ],
            ),
        };

        ToolSchema {
            name: self.name().into(),
            description: description.into(),
            parameters,
            has_side_effects: false,
        }
    }

    /// Build the analysis prompt for a call
    pub fn render(self, call: &ToolCall) -> Result<String> {
        let prompt = match self {
            Self::AnalyzeInvestment => call.parse_args::<AnalyzeInvestmentArgs>()?.render(),
            Self::PortfolioReview => call.parse_args::<PortfolioReviewArgs>()?.render(),
            Self::MarketAnalysis => call.parse_args::<MarketAnalysisArgs>()?.render(),
            Self::FinancialPlanning => call.parse_args::<FinancialPlanningArgs>()?.render(),
            Self::InvestmentEducation => call.parse_args::<InvestmentEducationArgs>()?.render(),
        };
        Ok(prompt)
    }
}

/// Schemas for the advisory family
pub fn advisory_schemas() -> Vec<ToolSchema> {
    AdvisoryTool::ALL.into_iter().map(AdvisoryTool::schema).collect()
}

/// Render and run one advisory call. Arguments are checked before any
/// provider call is made.
pub(crate) async fn execute(engine: &RoleEngine, tool: AdvisoryTool, call: &ToolCall) -> Result<ToolOutput> {
    tool.schema().validate(call)?;
    let prompt = tool.render(call)?;

    tracing::debug!(tool = tool.name(), prompt_len = prompt.len(), "Running advisory prompt");

    let text = engine.generate(GenerationRequest::new(prompt)).await?;
    Ok(ToolOutput::text(text))
}

#[derive(Deserialize)]
struct AnalyzeInvestmentArgs {
    investment_type: InvestmentType,
    amount: f64,
    time_horizon: TimeHorizon,
    risk_tolerance: RiskTolerance,
    #[serde(default)]
    additional_context: Option<String>,
}

impl AnalyzeInvestmentArgs {
    fn render(&self) -> String {
        let context = self
            .additional_context
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("None");

        format!(
            "Analyze this investment opportunity:\n\n\
             Investment Type: {}\n\
             Amount: {}\n\
             Time Horizon: {}\n\
             Risk Tolerance: {}\n\
             Additional Context: {context}\n\n\
             Please provide a comprehensive analysis including:\n\
             1. Risk assessment\n\
             2. Potential returns and volatility\n\
             3. Suitability for the given parameters\n\
             4. Diversification considerations\n\
             5. Alternative recommendations\n\
             6. Key factors to monitor",
            self.investment_type,
            format_usd(self.amount),
            self.time_horizon,
            self.risk_tolerance,
        )
    }
}

#[derive(Deserialize)]
struct PortfolioReviewArgs {
    portfolio_holdings: String,
    total_value: f64,
    goals: String,
    #[serde(default)]
    time_horizon: Option<String>,
}

impl PortfolioReviewArgs {
    fn render(&self) -> String {
        format!(
            "Review this investment portfolio:\n\n\
             Portfolio Holdings: {}\n\
             Total Value: {}\n\
             Goals: {}\n\
             Time Horizon: {}\n\n\
             Please provide a comprehensive portfolio review including:\n\
             1. Asset allocation analysis\n\
             2. Diversification assessment\n\
             3. Risk evaluation\n\
             4. Alignment with stated goals\n\
             5. Recommendations for optimization\n\
             6. Rebalancing suggestions",
            self.portfolio_holdings,
            format_usd(self.total_value),
            self.goals,
            self.time_horizon.as_deref().unwrap_or(TimeHorizon::LongTerm.as_str()),
        )
    }
}

#[derive(Deserialize)]
struct MarketAnalysisArgs {
    market_sector: MarketSector,
    analysis_type: AnalysisType,
    #[serde(default)]
    timeframe: Option<TimeHorizon>,
}

impl MarketAnalysisArgs {
    fn render(&self) -> String {
        let timeframe = self.timeframe.unwrap_or(TimeHorizon::MediumTerm);
        format!(
            "Provide {analysis} analysis for the {sector} sector:\n\n\
             Sector: {sector}\n\
             Analysis Type: {analysis}\n\
             Timeframe: {timeframe}\n\n\
             Please provide:\n\
             1. Current market conditions\n\
             2. Key trends and drivers\n\
             3. Risk factors\n\
             4. Investment opportunities\n\
             5. Outlook for the specified timeframe\n\
             6. Considerations for investors",
            analysis = self.analysis_type,
            sector = self.market_sector,
        )
    }
}

#[derive(Deserialize)]
struct FinancialPlanningArgs {
    age: u32,
    income: f64,
    goals: String,
    #[serde(default)]
    savings: Option<f64>,
    #[serde(default)]
    debt: Option<f64>,
}

impl FinancialPlanningArgs {
    fn render(&self) -> String {
        format!(
            "Provide financial planning advice:\n\n\
             Age: {}\n\
             Annual Income: {}\n\
             Current Savings: {}\n\
             Financial Goals: {}\n\
             Current Debt: {}\n\n\
             Please provide:\n\
             1. Financial health assessment\n\
             2. Goal prioritization\n\
             3. Savings and investment recommendations\n\
             4. Debt management strategies\n\
             5. Retirement planning considerations\n\
             6. Risk management recommendations\n\
             7. Action plan and timeline",
            self.age,
            format_usd(self.income),
            format_usd(self.savings.unwrap_or(0.0)),
            self.goals,
            format_usd(self.debt.unwrap_or(0.0)),
        )
    }
}

#[derive(Deserialize)]
struct InvestmentEducationArgs {
    topic: EducationTopic,
    #[serde(default)]
    complexity: Option<Complexity>,
}

impl InvestmentEducationArgs {
    fn render(&self) -> String {
        let complexity = self.complexity.unwrap_or(Complexity::Intermediate);
        format!(
            "Provide {complexity}-level education about {topic}:\n\n\
             Topic: {topic}\n\
             Complexity Level: {complexity}\n\n\
             Please provide:\n\
             1. Clear explanation of the concept\n\
             2. Practical examples\n\
             3. Common mistakes to avoid\n\
             4. Best practices\n\
             5. How it fits into overall investment strategy\n\
             6. Additional resources for learning",
            topic = self.topic,
        )
    }
}

/// Format a dollar amount with thousands separators and two decimals,
/// e.g. `$1,234,567.89`
pub fn format_usd(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("${sign}{grouped}.{cents}")
}
