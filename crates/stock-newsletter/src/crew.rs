//! The stock newsletter crew
//!
//! Three agents work a ticker under a manager: a price analyst reads a year
//! of daily prices, a news analyst scores fear and greed from recent news,
//! and a writer turns both reports into a three paragraph newsletter.

use crate::api::{DuckDuckGoNewsClient, NewsSearch, PriceHistorySource, YahooFinanceClient};
use crate::config::NewsletterConfig;
use crate::error::Result;
use crate::tools::{NewsSearchTool, YahooFinanceTool};
use chrono::{DateTime, Local};
use crew_llm::LLMProvider;
use crew_runtime::{Crew, CrewAgent, CrewAgentBuilder, Process, Task};
use std::sync::Arc;

/// Kickoff input holding the ticker
pub const TICKER_INPUT: &str = "ticker";

pub const PRICE_ANALYST_ROLE: &str = "Senior Stock price Analyst";
pub const NEWS_ANALYST_ROLE: &str = "Stock News Analyst";
pub const WRITER_ROLE: &str = "Senior Stock Analyst Writer";

fn agent_base(
    role: &str,
    llm: &Arc<dyn LLMProvider>,
    config: &NewsletterConfig,
) -> CrewAgentBuilder {
    CrewAgent::builder(role)
        .llm(llm.clone())
        .model(&config.model)
        .max_tokens(config.max_tokens)
        .temperature(config.temperature)
        .verbose(true)
        .memory(true)
}

/// Reads the price history and calls the trend
pub fn stock_price_analyst(
    llm: &Arc<dyn LLMProvider>,
    config: &NewsletterConfig,
    prices: Arc<dyn PriceHistorySource>,
) -> Result<CrewAgent> {
    Ok(agent_base(PRICE_ANALYST_ROLE, llm, config)
        .goal("Find the {{ ticker }} stock price and analysis trends")
        .backstory(
            "You're a highly experienced in analysing the price of \
             an especific stock and make predictions about its future price.",
        )
        .tool(Arc::new(YahooFinanceTool::new(
            prices,
            config.history_start,
            config.history_end,
        )))
        .max_iter(config.max_iter)
        .allow_delegation(false)
        .build()?)
}

/// Summarizes the news and scores fear and greed per asset
pub fn news_analyst(
    llm: &Arc<dyn LLMProvider>,
    config: &NewsletterConfig,
    news: Arc<dyn NewsSearch>,
) -> Result<CrewAgent> {
    Ok(agent_base(NEWS_ANALYST_ROLE, llm, config)
        .goal(
            "Create a short summary of the market news related to stock {{ ticker }} company. \
             Specify the current trend - up, down or sideways taking into consideration the news context. \
             For each request stockt asset, specify a number within 0 and 100, where 0 is extreme fear \
             and 100 is extreme greed.",
        )
        .backstory(
            "You're a highly experienced in analysing market trends and news and have tracked assets \
             for more then 10 years.\n\
             You're also a master level analyst in thre tradicional markets and have deep fundamentalist \
             understanding of the financial information of the companies.\n\
             You understand news, theirs titles and information, but you look at then with a healthy dose \
             of skepticism.\n\
             You consider also the source of the news articles, ignoring the non reputable sources.",
        )
        .tool(Arc::new(NewsSearchTool::new(news, config.news_results)))
        .max_iter(config.max_iter)
        .max_rpm(config.max_rpm)
        .allow_delegation(false)
        .build()?)
}

/// Writes the newsletter, may ask the analysts for more
pub fn stock_analyst_writer(
    llm: &Arc<dyn LLMProvider>,
    config: &NewsletterConfig,
) -> Result<CrewAgent> {
    Ok(agent_base(WRITER_ROLE, llm, config)
        .goal(
            "Write an insightfull compelling and informative 3 paragraph long newsletter \
             based on the stock report and price trend.",
        )
        .backstory(
            "You're widely accepted as the best stock analyst in the market. You understand complex \
             concepts and create compelling stores and narratives that are solid. You follow the \
             investing phylosophy of Howard Marks.\n\
             You are able to hold multiple options when analysing anything.",
        )
        .max_iter(5)
        .allow_delegation(true)
        .build()?)
}

pub fn get_stock_price() -> Result<Task> {
    Ok(Task::builder(
        "Analyze the stock {{ ticker }} price history and create a trend analyses of up, down or sideways",
    )
    .name("get_stock_price")
    .expected_output(
        "Specify the current trend stock price - up, down or sideways, Eg. stock= 'APPL, price UP'",
    )
    .agent(PRICE_ANALYST_ROLE)
    .build()?)
}

/// News task; the date is fixed when the crew is built
pub fn get_news(now: DateTime<Local>) -> Result<Task> {
    let description = format!(
        "Take the stock and always include ADA(from Cardano) and BTC to it(if not requested).\n\
         Use the search tool to search each one individually.\n\n\
         the current date is {}.\n\n\
         Compose the results into a helpfull report.",
        now.format("%Y-%m-%d %H:%M:%S%.6f")
    );

    Ok(Task::builder(description)
        .name("get_news")
        .expected_output(
            "A summary of the overall market and one sentence summary for each requested asset.\n\
             Include a fear/greed score for each asset based on the news.\n\
             Use the format:\n\
             <STOCK ASSET>\n\
             <SUMMARY BASED ON NEWS>\n\
             <TREND PREDICTION>\n\
             <FEAR/GREED SCORE>",
        )
        .agent(NEWS_ANALYST_ROLE)
        .build()?)
}

pub fn write_analyses() -> Result<Task> {
    Ok(Task::builder(
        "Use the stock price trend and the stock news report to create an analyses \
         and write the newsletter about the {{ ticker }} company.\n\
         Be brief and highlight the most important points.\n\
         Focus on the stock price trend, Price-to-Earnings (P/E) ratio , news and fear/greed score.\n\
         What are the near future considerations?\n\
         Include the previous analyses of stock trend and news summary.",
    )
    .name("write_analyses")
    .expected_output(
        "An eloquent 3 paragraphs newsletter formated as markdown in an easy readable manner.\n\
         It should contain:\n\
         - bullet points for executive summary\n\
         - Introduction - set the overall picture and spike up the interest\n\
         - main part provides the rest of the analysis including the news summary and fear/greed scores\n\
         - summary - key facts and concrete future trend prediction - up, down and sideways.\n\
         - Price-to-Earnings (P/E) ratio relation to stock price - cheap, regular or expensive.",
    )
    .agent(WRITER_ROLE)
    .context([0, 1])
    .build()?)
}

/// Build the newsletter crew backed by Yahoo Finance and DuckDuckGo
pub fn build_crew(llm: Arc<dyn LLMProvider>, config: &NewsletterConfig) -> Result<Crew> {
    build_crew_with(
        llm,
        config,
        Arc::new(YahooFinanceClient::new()),
        Arc::new(DuckDuckGoNewsClient::new(config.max_rpm)?),
    )
}

/// Build the newsletter crew with custom data sources
pub fn build_crew_with(
    llm: Arc<dyn LLMProvider>,
    config: &NewsletterConfig,
    prices: Arc<dyn PriceHistorySource>,
    news: Arc<dyn NewsSearch>,
) -> Result<Crew> {
    config.validate()?;

    Ok(Crew::builder()
        .agent(stock_price_analyst(&llm, config, prices)?)
        .agent(news_analyst(&llm, config, news)?)
        .agent(stock_analyst_writer(&llm, config)?)
        .task(get_stock_price()?)
        .task(get_news(Local::now())?)
        .task(write_analyses()?)
        .process(Process::Hierarchical)
        .manager_llm(llm)
        .manager_model(&config.model)
        .manager_max_iter(config.max_iter)
        .max_rpm(config.max_rpm)
        .full_output(true)
        .verbose(true)
        .build()?)
}
