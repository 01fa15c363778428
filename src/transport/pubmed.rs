//! Best-effort public search fallback using the NCBI E-utilities API.
//!
//! Only reached when the configured resolver server cannot serve a search.
//! The fallback answers with bare article rows; citation formatting still
//! requires a lookup through the normal transports.

use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::ClientError;
use crate::models::SearchArticle;
use crate::utils::HttpClient;

const ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const EFETCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

/// Direct PubMed search client
#[derive(Debug, Clone, Default)]
pub struct PubMedFallback {
    client: HttpClient,
}

impl PubMedFallback {
    pub fn new() -> Self {
        Self {
            client: HttpClient::new(),
        }
    }

    /// One ESearch + EFetch round trip. Zero hits is an empty list.
    pub async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<SearchArticle>, ClientError> {
        let search_url = format!(
            "{}?db=pubmed&term={}&retmax={}&retmode=xml",
            ESEARCH_URL,
            urlencoding::encode(query),
            max_results
        );
        let xml = self.fetch_text(&search_url).await?;
        let pmids = parse_esearch(&xml)?;
        if pmids.is_empty() {
            return Ok(Vec::new());
        }

        let fetch_url = format!("{}?db=pubmed&id={}&retmode=xml", EFETCH_URL, pmids.join(","));
        let xml = self.fetch_text(&fetch_url).await?;
        parse_efetch(&xml)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, ClientError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Transport(format!(
                "NCBI returned {}",
                response.status()
            )));
        }
        Ok(response.text().await?)
    }
}

/// Pull the PMID list out of an ESearch response
fn parse_esearch(xml: &str) -> Result<Vec<String>, ClientError> {
    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct ESearchResult {
        IdList: IdList,
    }

    #[derive(Debug, Deserialize)]
    struct IdList {
        #[serde(rename = "Id", default)]
        ids: Vec<String>,
    }

    let result: ESearchResult = from_str(xml)
        .map_err(|e| ClientError::Parse(format!("ESearch XML: {}", e)))?;
    Ok(result.IdList.ids)
}

/// Turn an EFetch article set into search rows
fn parse_efetch(xml: &str) -> Result<Vec<SearchArticle>, ClientError> {
    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct PubmedArticleSet {
        #[serde(rename = "PubmedArticle", default)]
        articles: Vec<PubmedArticle>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct PubmedArticle {
        MedlineCitation: Option<MedlineCitation>,
        PubmedData: Option<PubmedData>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct MedlineCitation {
        PMID: Option<Pmid>,
        Article: Option<Article>,
    }

    #[derive(Debug, Deserialize)]
    struct Pmid {
        #[serde(rename = "$text")]
        id: String,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct Article {
        Journal: Option<Journal>,
        ArticleTitle: Option<ArticleTitle>,
        AuthorList: Option<AuthorList>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct Journal {
        Title: Option<String>,
        JournalIssue: Option<JournalIssue>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct JournalIssue {
        PubDate: Option<PubDate>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct PubDate {
        Year: Option<String>,
        #[serde(rename = "MedlineDate")]
        medline_date: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct ArticleTitle {
        #[serde(rename = "$text")]
        title: String,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct AuthorList {
        #[serde(rename = "Author", default)]
        authors: Vec<Author>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct Author {
        LastName: Option<TextNode>,
        Initials: Option<TextNode>,
        CollectiveName: Option<TextNode>,
    }

    #[derive(Debug, Deserialize)]
    struct TextNode {
        #[serde(rename = "$text")]
        text: String,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct PubmedData {
        ArticleIdList: Option<ArticleIdList>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct ArticleIdList {
        #[serde(rename = "ArticleId", default)]
        ids: Vec<ArticleId>,
    }

    #[derive(Debug, Deserialize)]
    struct ArticleId {
        #[serde(rename = "@IdType")]
        id_type: String,
        #[serde(rename = "$text")]
        value: String,
    }

    let result: PubmedArticleSet =
        from_str(xml).map_err(|e| ClientError::Parse(format!("EFetch XML: {}", e)))?;

    let mut articles = Vec::new();
    for article in result.articles {
        let citation = article.MedlineCitation.as_ref();
        let pmid = citation
            .and_then(|m| m.PMID.as_ref())
            .map(|p| p.id.clone())
            .unwrap_or_default();
        if pmid.is_empty() {
            continue;
        }

        let inner = citation.and_then(|m| m.Article.as_ref());
        let title = inner
            .and_then(|a| a.ArticleTitle.as_ref())
            .map(|t| t.title.trim_end_matches('.').to_string())
            .unwrap_or_default();

        let authors = inner
            .and_then(|a| a.AuthorList.as_ref())
            .map(|list| {
                list.authors
                    .iter()
                    .map(|author| {
                        if let Some(collective) = &author.CollectiveName {
                            collective.text.clone()
                        } else {
                            let last = author
                                .LastName
                                .as_ref()
                                .map(|l| l.text.as_str())
                                .unwrap_or("");
                            let initials = author
                                .Initials
                                .as_ref()
                                .map(|i| i.text.as_str())
                                .unwrap_or("");
                            format!("{} {}", last, initials).trim().to_string()
                        }
                    })
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let journal = inner
            .and_then(|a| a.Journal.as_ref())
            .and_then(|j| j.Title.clone());

        let year = inner
            .and_then(|a| a.Journal.as_ref())
            .and_then(|j| j.JournalIssue.as_ref())
            .and_then(|ji| ji.PubDate.as_ref())
            .and_then(|pd| {
                pd.Year
                    .clone()
                    .or_else(|| pd.medline_date.as_ref().map(|d| d.chars().take(4).collect()))
            });

        let doi = article
            .PubmedData
            .as_ref()
            .and_then(|pd| pd.ArticleIdList.as_ref())
            .and_then(|list| list.ids.iter().find(|id| id.id_type == "doi"))
            .map(|id| id.value.clone());

        articles.push(SearchArticle {
            pmid,
            title,
            authors,
            journal,
            year,
            doi,
        });
    }

    Ok(articles)
}
