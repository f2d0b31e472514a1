/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: query endpoint の分類と bearer 検証 (AuthGate)
 * - cors / http / security_headers: transport 全体に掛ける layer
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
